//! Constant-acceleration Kalman filter for centroid tracking using ndarray
//! and a manual/nalgebra-based inverse.

use ndarray::{Array1, Array2};

use crate::tracker::geometry::Point;

/// Tuning parameters for the constant-acceleration motion model.
#[derive(Debug, Clone)]
pub struct KalmanConfig {
    /// Sampling interval between two consecutive updates
    pub dt: f64,
    /// Acceleration bias in the x direction
    pub u_x: f64,
    /// Acceleration bias in the y direction
    pub u_y: f64,
    /// Process noise magnitude
    pub std_acc: f64,
    /// Measurement noise standard deviation in x
    pub x_std_meas: f64,
    /// Measurement noise standard deviation in y
    pub y_std_meas: f64,
}

impl Default for KalmanConfig {
    fn default() -> Self {
        Self {
            dt: 0.033,
            u_x: 0.0,
            u_y: 0.0,
            std_acc: 5.0,
            x_std_meas: 0.1,
            y_std_meas: 0.1,
        }
    }
}

/// Per-track state estimator over `[x, y, vx, vy]`.
///
/// `predict` runs once per frame whether or not a measurement arrived;
/// `correct` folds in a real measurement or coasts on the prediction.
#[derive(Debug, Clone)]
pub struct KalmanFilter {
    transition: Array2<f64>,
    control: Array2<f64>,
    measurement_map: Array2<f64>,
    process_noise: Array2<f64>,
    measurement_noise: Array2<f64>,
    control_input: Array1<f64>,
    state: Array1<f64>,
    covariance: Array2<f64>,
}

impl KalmanFilter {
    pub fn new(config: &KalmanConfig, initial: Point) -> Self {
        let dt = config.dt;

        let mut transition = Array2::eye(4);
        transition[[0, 2]] = dt;
        transition[[1, 3]] = dt;

        let mut control = Array2::zeros((4, 2));
        control[[0, 0]] = dt * dt / 2.0;
        control[[1, 1]] = dt * dt / 2.0;
        control[[2, 0]] = dt;
        control[[3, 1]] = dt;

        let mut measurement_map = Array2::zeros((2, 4));
        measurement_map[[0, 0]] = 1.0;
        measurement_map[[1, 1]] = 1.0;

        let dt2 = dt * dt;
        let dt3 = dt2 * dt;
        let dt4 = dt2 * dt2;
        let mut process_noise = Array2::zeros((4, 4));
        process_noise[[0, 0]] = dt4 / 4.0;
        process_noise[[1, 1]] = dt4 / 4.0;
        process_noise[[0, 2]] = dt3 / 2.0;
        process_noise[[2, 0]] = dt3 / 2.0;
        process_noise[[1, 3]] = dt3 / 2.0;
        process_noise[[3, 1]] = dt3 / 2.0;
        process_noise[[2, 2]] = dt2;
        process_noise[[3, 3]] = dt2;
        let q = config.std_acc * config.std_acc;
        process_noise.mapv_inplace(|v| v * q);

        let mut measurement_noise = Array2::zeros((2, 2));
        measurement_noise[[0, 0]] = config.x_std_meas * config.x_std_meas;
        measurement_noise[[1, 1]] = config.y_std_meas * config.y_std_meas;

        let control_input = Array1::from_vec(vec![config.u_x, config.u_y]);
        let state = Array1::from_vec(vec![initial.x as f64, initial.y as f64, 0.0, 0.0]);
        let covariance = Array2::eye(4);

        Self {
            transition,
            control,
            measurement_map,
            process_noise,
            measurement_noise,
            control_input,
            state,
            covariance,
        }
    }

    /// Current position estimate.
    pub fn position(&self) -> Point {
        Point::new(self.state[0] as f32, self.state[1] as f32)
    }

    /// Advance state and covariance one step under the motion model.
    ///
    /// Runs once per frame per track, measurement or not.
    pub fn predict(&mut self) -> Point {
        // x = A x + B u
        self.state = self.transition.dot(&self.state) + self.control.dot(&self.control_input);
        // P = A P A^T + Q
        self.covariance =
            self.transition.dot(&self.covariance).dot(&self.transition.t()) + &self.process_noise;
        self.position()
    }

    /// Fold a real measurement into the state, or coast on the prediction
    /// when no measurement exists this frame.
    ///
    /// Coasting keeps the velocity-driven estimate from `predict` intact
    /// rather than snapping the state anywhere, which is what lets a track
    /// keep moving plausibly through a short occlusion.
    pub fn correct(&mut self, measurement: Option<Point>) -> Point {
        let Some(point) = measurement else {
            return self.position();
        };

        let z = Array1::from_vec(vec![point.x as f64, point.y as f64]);
        let innovation = z - self.measurement_map.dot(&self.state);

        // S = H P H^T + R
        let innovation_cov = self
            .measurement_map
            .dot(&self.covariance)
            .dot(&self.measurement_map.t())
            + &self.measurement_noise;
        let s_inv = invert_2x2(&innovation_cov);

        // K = P H^T S^-1
        let gain = self.covariance.dot(&self.measurement_map.t()).dot(&s_inv);

        self.state = &self.state + &gain.dot(&innovation);
        // P = (I - K H) P
        let identity: Array2<f64> = Array2::eye(4);
        self.covariance = (identity - gain.dot(&self.measurement_map)).dot(&self.covariance);
        self.position()
    }
}

/// Helper to invert the 2x2 innovation covariance using nalgebra (pure Rust).
fn invert_2x2(m: &Array2<f64>) -> Array2<f64> {
    let nm = nalgebra::Matrix2::new(m[[0, 0]], m[[0, 1]], m[[1, 0]], m[[1, 1]]);
    let inv = nm
        .try_inverse()
        .expect("2x2 innovation covariance inversion failed");
    let mut res = Array2::zeros((2, 2));
    for i in 0..2 {
        for j in 0..2 {
            res[[i, j]] = inv[(i, j)];
        }
    }
    res
}
