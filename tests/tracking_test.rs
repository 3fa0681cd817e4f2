use buffertrack_rs::tracker::{
    CentroidTracker, CoastBoxPolicy, KalmanConfig, Point, Rect, TrackError, TrackRecord,
    TrackState, TrackerConfig,
};

fn plain_config() -> TrackerConfig {
    TrackerConfig {
        dist_thresh: 5.0,
        max_frames_to_skip: 2,
        max_trace_length: 10,
        use_kalman: false,
        ..TrackerConfig::default()
    }
}

#[test]
fn test_bootstrap_two_detections() {
    let mut tracker = CentroidTracker::new(plain_config());
    tracker
        .update(&[Point::new(0.0, 0.0), Point::new(10.0, 10.0)], None, None)
        .unwrap();

    let ids: Vec<u64> = tracker.tracks().map(|t| t.track_id).collect();
    assert_eq!(ids, vec![0, 1]);
}

#[test]
fn test_match_within_threshold_resets_skip_counter() {
    let mut tracker = CentroidTracker::new(plain_config());
    tracker.update(&[Point::new(0.0, 0.0)], None, None).unwrap();

    // Miss a frame so the skip counter has something to reset from.
    tracker.update(&[], None, None).unwrap();
    assert_eq!(tracker.get(0).unwrap().skipped_frames, 1);

    // Distance ~1.41 < 5: matched.
    tracker.update(&[Point::new(1.0, 1.0)], None, None).unwrap();
    let track = tracker.get(0).unwrap();
    assert_eq!(track.skipped_frames, 0);
    assert_eq!(track.state, TrackState::Tracked);
    assert_eq!(track.position, Point::new(1.0, 1.0));
    assert_eq!(tracker.len(), 1);
}

#[test]
fn test_far_detection_goes_to_no_match_and_spawns() {
    let mut tracker = CentroidTracker::new(plain_config());
    tracker.update(&[Point::new(0.0, 0.0)], None, None).unwrap();

    // 100 > 5: the old track coasts, the detection starts a new identity.
    tracker
        .update(&[Point::new(100.0, 100.0)], None, None)
        .unwrap();

    assert_eq!(tracker.len(), 2);
    let old = tracker.get(0).unwrap();
    assert_eq!(old.skipped_frames, 1);
    assert_eq!(old.state, TrackState::Coasting);
    assert_eq!(old.position, Point::new(0.0, 0.0));

    let new = tracker.get(1).unwrap();
    assert_eq!(new.position, Point::new(100.0, 100.0));
    assert_eq!(new.state, TrackState::New);
}

#[test]
fn test_deletion_on_first_frame_over_skip_limit() {
    // max_frames_to_skip = 2: survives two missed frames, dies on the third.
    let mut tracker = CentroidTracker::new(plain_config());
    tracker.update(&[Point::new(0.0, 0.0)], None, None).unwrap();

    tracker.update(&[], None, None).unwrap();
    assert_eq!(tracker.len(), 1);
    tracker.update(&[], None, None).unwrap();
    assert_eq!(tracker.len(), 1);
    tracker.update(&[], None, None).unwrap();
    assert!(tracker.is_empty());
}

#[test]
fn test_deleted_id_is_never_reassigned() {
    let mut tracker = CentroidTracker::new(plain_config());
    tracker.update(&[Point::new(0.0, 0.0)], None, None).unwrap();
    assert_eq!(tracker.get(0).unwrap().track_id, 0);

    // Let the track die.
    for _ in 0..3 {
        tracker.update(&[], None, None).unwrap();
    }
    assert!(tracker.is_empty());

    // The same object reappearing is a new identity.
    tracker.update(&[Point::new(0.0, 0.0)], None, None).unwrap();
    let ids: Vec<u64> = tracker.tracks().map(|t| t.track_id).collect();
    assert_eq!(ids, vec![1]);
}

#[test]
fn test_ids_are_stable_across_frames() {
    let mut tracker = CentroidTracker::new(plain_config());
    tracker
        .update(&[Point::new(0.0, 0.0), Point::new(50.0, 50.0)], None, None)
        .unwrap();

    for step in 1..=20 {
        let offset = step as f32 * 0.5;
        tracker
            .update(
                &[
                    Point::new(offset, 0.0),
                    Point::new(50.0 + offset, 50.0),
                ],
                None,
                None,
            )
            .unwrap();
        let ids: Vec<u64> = tracker.tracks().map(|t| t.track_id).collect();
        assert_eq!(ids, vec![0, 1]);
    }
}

#[test]
fn test_trace_lengths_stay_bounded() {
    let config = TrackerConfig {
        max_trace_length: 5,
        record_boxes: true,
        ..plain_config()
    };
    let mut tracker = CentroidTracker::new(config);

    for step in 0..30 {
        let x = step as f32 * 0.5;
        tracker
            .update(
                &[Point::new(x, 0.0)],
                None,
                Some(&[Rect::new(x, 0.0, 4.0, 4.0)]),
            )
            .unwrap();
        let track = tracker.get(0).unwrap();
        assert!(track.trace.len() <= 5);
        assert!(track.bbox_trace.len() <= 5);
    }

    // Oldest entries were evicted first.
    let track = tracker.get(0).unwrap();
    assert_eq!(track.trace.front().unwrap().x, 12.5);
    assert_eq!(track.trace.back().unwrap().x, 14.5);
}

#[test]
fn test_class_history_records_absent_frames() {
    let config = TrackerConfig {
        record_classes: true,
        ..plain_config()
    };
    let mut tracker = CentroidTracker::new(config);

    tracker
        .update(&[Point::new(0.0, 0.0)], Some(&[Some("ant".to_string())]), None)
        .unwrap();
    tracker
        .update(&[Point::new(1.0, 0.0)], Some(&[Some("bee".to_string())]), None)
        .unwrap();
    tracker.update(&[], Some(&[]), None).unwrap();

    let track = tracker.get(0).unwrap();
    assert_eq!(
        track.class_history,
        vec![Some("ant".to_string()), Some("bee".to_string()), None]
    );
    assert_eq!(track.last_class(), Some("bee"));
}

#[test]
fn test_coast_box_policies() {
    let repeat = TrackerConfig {
        record_boxes: true,
        ..plain_config()
    };
    let mut tracker = CentroidTracker::new(repeat);
    let bbox = Rect::new(0.0, 0.0, 8.0, 8.0);
    tracker
        .update(&[Point::new(0.0, 0.0)], None, Some(&[bbox]))
        .unwrap();
    tracker.update(&[], None, Some(&[])).unwrap();
    assert_eq!(
        tracker.get(0).unwrap().bbox_trace,
        vec![bbox, bbox]
    );

    let skip = TrackerConfig {
        record_boxes: true,
        coast_box_policy: CoastBoxPolicy::Skip,
        ..plain_config()
    };
    let mut tracker = CentroidTracker::new(skip);
    tracker
        .update(&[Point::new(0.0, 0.0)], None, Some(&[bbox]))
        .unwrap();
    tracker.update(&[], None, Some(&[])).unwrap();
    assert_eq!(tracker.get(0).unwrap().bbox_trace, vec![bbox]);
}

#[test]
fn test_restore_round_trip() {
    let config = TrackerConfig {
        record_classes: true,
        record_boxes: true,
        ..plain_config()
    };
    let mut tracker = CentroidTracker::new(config);

    let record = TrackRecord {
        id: 7,
        x: 3.0,
        y: 4.0,
        class: Some("ant".to_string()),
        bbox: Some(Rect::new(1.0, 2.0, 4.0, 4.0)),
    };

    // The record survives serialization unchanged.
    let json = serde_json::to_string(&record).unwrap();
    let decoded: TrackRecord = serde_json::from_str(&json).unwrap();
    assert_eq!(decoded, record);

    tracker.restore_track(&decoded).unwrap();
    let track = tracker.get(7).unwrap();
    assert_eq!(track.position, Point::new(3.0, 4.0));
    assert_eq!(track.last_class(), Some("ant"));

    // Clearing and restoring again yields the identical identity and state.
    tracker.clear_tracks();
    tracker.restore_track(&decoded).unwrap();
    let track = tracker.get(7).unwrap();
    assert_eq!(track.track_id, 7);
    assert_eq!(track.position, Point::new(3.0, 4.0));

    // The next auto-generated id exceeds every restored id.
    tracker
        .update(
            &[Point::new(3.0, 4.0), Point::new(100.0, 100.0)],
            Some(&[None, None]),
            Some(&[Rect::default(), Rect::default()]),
        )
        .unwrap();
    let ids: Vec<u64> = tracker.tracks().map(|t| t.track_id).collect();
    assert_eq!(ids, vec![7, 8]);
}

#[test]
fn test_length_mismatch_fails_fast() {
    let config = TrackerConfig {
        record_boxes: true,
        ..plain_config()
    };
    let mut tracker = CentroidTracker::new(config);
    let err = tracker
        .update(
            &[Point::new(0.0, 0.0), Point::new(1.0, 1.0)],
            None,
            Some(&[Rect::default()]),
        )
        .unwrap_err();
    assert_eq!(
        err,
        TrackError::LengthMismatch {
            field: "boxes",
            expected: 2,
            got: 1,
        }
    );
    assert!(tracker.is_empty());
}

#[test]
fn test_coasting_track_is_reacquired_near_predicted_position() {
    // Frame-unit Kalman tuning so the velocity estimate converges quickly.
    let config = TrackerConfig {
        dist_thresh: 10.0,
        max_frames_to_skip: 5,
        max_trace_length: 30,
        use_kalman: true,
        kalman: KalmanConfig {
            dt: 1.0,
            std_acc: 1.0,
            ..KalmanConfig::default()
        },
        ..TrackerConfig::default()
    };
    let mut tracker = CentroidTracker::new(config);

    // Object moving +5 in x per frame, observed for six frames.
    for frame in 0..=5 {
        tracker
            .update(&[Point::new(5.0 * frame as f32, 0.0)], None, None)
            .unwrap();
    }
    assert_eq!(tracker.len(), 1);
    let observed_x = tracker.get(0).unwrap().position.x;

    // Three frames of occlusion: the track coasts along its velocity.
    for _ in 0..3 {
        tracker.update(&[], None, None).unwrap();
    }
    let track = tracker.get(0).unwrap();
    assert_eq!(track.state, TrackState::Coasting);
    assert_eq!(track.skipped_frames, 3);
    assert!(track.position.x > observed_x + 10.0);

    // The object reappears where the motion carried it: far from the last
    // observation (distance 14 > threshold) but close to the prediction.
    tracker.update(&[Point::new(39.0, 0.0)], None, None).unwrap();
    assert_eq!(tracker.len(), 1);
    let track = tracker.get(0).unwrap();
    assert_eq!(track.track_id, 0);
    assert_eq!(track.skipped_frames, 0);
    assert_eq!(track.state, TrackState::Tracked);
}

#[test]
fn test_kalman_disabled_keeps_position_verbatim_when_unmatched() {
    let mut tracker = CentroidTracker::new(plain_config());
    tracker.update(&[Point::new(2.0, 3.0)], None, None).unwrap();
    tracker.update(&[], None, None).unwrap();
    tracker.update(&[], None, None).unwrap();

    let track = tracker.get(0).unwrap();
    assert_eq!(track.position, Point::new(2.0, 3.0));
    // The trace still records every frame, repeats included.
    assert_eq!(track.trace.len(), 3);
}
