use approx::assert_abs_diff_eq;
use fusion_tracker_rs::sensors::parse_line;
use fusion_tracker_rs::{
    FusionConfig, FusionEkf, FusionError, MeasurementPackage, TimestampPolicy,
};

fn radar_of(px: f64, py: f64, vx: f64, vy: f64, timestamp: i64) -> MeasurementPackage {
    let rho = px.hypot(py);
    MeasurementPackage::radar(rho, py.atan2(px), (px * vx + py * vy) / rho, timestamp)
}

#[test]
fn laser_first_packet_initializes() {
    let mut ekf = FusionEkf::default();
    ekf.process_measurement(&MeasurementPackage::laser(1.0, 2.0, 1_000_000))
        .unwrap();

    assert!(ekf.is_initialized());
    let x = ekf.state().unwrap();
    assert_eq!((x[0], x[1], x[2], x[3]), (1.0, 2.0, 5.0, 0.0));
    assert_eq!(ekf.previous_timestamp(), 1_000_000);
    assert_eq!(ekf.cached_dt(), None);
}

#[test]
fn radar_first_packet_initializes() {
    let mut ekf = FusionEkf::default();
    ekf.process_measurement(&MeasurementPackage::radar(5.0, 0.0, 1.0, 0))
        .unwrap();

    let x = ekf.state().unwrap();
    assert_abs_diff_eq!(x[0], 5.0, epsilon = 1e-12);
    assert_abs_diff_eq!(x[1], 0.0, epsilon = 1e-12);
    assert_abs_diff_eq!(x[2], 1.0, epsilon = 1e-12);
    assert_abs_diff_eq!(x[3], 0.0, epsilon = 1e-12);
    assert_eq!(ekf.previous_timestamp(), 0);
}

#[test]
fn second_laser_packet_predicts_then_blends() {
    let mut ekf = FusionEkf::default();
    ekf.process_measurement(&MeasurementPackage::laser(1.0, 2.0, 1_000_000))
        .unwrap();
    ekf.process_measurement(&MeasurementPackage::laser(1.1, 2.05, 1_050_000))
        .unwrap();

    assert_eq!(ekf.cached_dt(), Some(0.05));
    assert_eq!(ekf.previous_timestamp(), 1_050_000);

    // Predicted px is 1.0 + 5.0 * 0.05 = 1.25, measured 1.1
    let x = ekf.state().unwrap();
    assert!(x[0] > 1.1 && x[0] < 1.25, "px = {}", x[0]);
    assert!(x[1] > 2.0 && x[1] < 2.05, "py = {}", x[1]);

    let p = ekf.covariance().unwrap();
    assert_eq!(*p, p.transpose());
    assert!(p.diagonal().iter().all(|v| *v > 0.0));
}

#[test]
fn mixed_sensors_track_straight_line() {
    let (x0, y0, vx, vy) = (2.0, 1.0, 1.0, 0.5);
    let mut ekf = FusionEkf::default();

    for step in 0..120i64 {
        let t = step as f64 * 0.05;
        let (px, py) = (x0 + vx * t, y0 + vy * t);
        let timestamp = step * 50_000;
        let pkg = if step % 2 == 0 {
            MeasurementPackage::laser(px, py, timestamp)
        } else {
            radar_of(px, py, vx, vy, timestamp)
        };
        ekf.process_measurement(&pkg).unwrap();
    }

    let snapshot = ekf.snapshot().unwrap();
    let t_end = 119.0 * 0.05;
    assert_abs_diff_eq!(snapshot.position.0, x0 + vx * t_end, epsilon = 0.1);
    assert_abs_diff_eq!(snapshot.position.1, y0 + vy * t_end, epsilon = 0.1);
    assert_abs_diff_eq!(snapshot.velocity.0, vx, epsilon = 0.3);
    assert_abs_diff_eq!(snapshot.velocity.1, vy, epsilon = 0.3);
    assert_eq!(snapshot.laser_updates, 59);
    assert_eq!(snapshot.radar_updates, 60);
    assert_eq!(snapshot.skipped_updates, 0);

    // One rebuild for the constant 50 ms cadence
    assert_eq!(ekf.cached_dt(), Some(0.05));
}

#[test]
fn radar_crossing_the_bearing_seam_stays_stable() {
    // Object behind the sensor moving from +y to -y across the ±π seam
    let mut ekf = FusionEkf::default();
    let (vx, vy) = (0.0, -1.0);
    for step in 0..80i64 {
        let t = step as f64 * 0.05;
        let (px, py) = (-10.0, 1.0 + vy * t);
        ekf.process_measurement(&radar_of(px, py, vx, vy, step * 50_000))
            .unwrap();
    }
    let x = ekf.state().unwrap();
    let py_end = 1.0 - 79.0 * 0.05;
    assert_abs_diff_eq!(x[0], -10.0, epsilon = 0.25);
    assert_abs_diff_eq!(x[1], py_end, epsilon = 0.25);
}

#[test]
fn degenerate_radar_is_skipped_not_fatal() {
    let mut ekf = FusionEkf::default();
    // Initializes at the origin with velocity prior (5, 0)
    ekf.process_measurement(&MeasurementPackage::laser(0.0, 0.0, 0))
        .unwrap();
    // Zero elapsed time keeps the predicted position at the origin
    let err = ekf
        .process_measurement(&MeasurementPackage::radar(1.0, 0.0, 0.0, 0))
        .unwrap_err();
    assert!(err.is_skipped_update());

    // The filter keeps working afterwards
    ekf.process_measurement(&MeasurementPackage::laser(0.3, 0.0, 50_000))
        .unwrap();
    let snapshot = ekf.snapshot().unwrap();
    assert_eq!(snapshot.skipped_updates, 1);
    assert_eq!(snapshot.laser_updates, 1);
    assert!(snapshot.position.0.is_finite());
}

#[test]
fn out_of_order_policy_is_configurable() {
    let late = MeasurementPackage::laser(1.0, 2.0, 900_000);

    let mut strict = FusionEkf::default();
    strict
        .process_measurement(&MeasurementPackage::laser(1.0, 2.0, 1_000_000))
        .unwrap();
    let before = *strict.state().unwrap();
    assert_eq!(
        strict.process_measurement(&late).unwrap_err(),
        FusionError::OutOfOrderTimestamp {
            previous: 1_000_000,
            current: 900_000
        }
    );
    assert_eq!(*strict.state().unwrap(), before);

    let mut clamped = FusionEkf::new(FusionConfig {
        timestamp_policy: TimestampPolicy::Clamp,
        ..FusionConfig::default()
    })
    .unwrap();
    clamped
        .process_measurement(&MeasurementPackage::laser(1.0, 2.0, 1_000_000))
        .unwrap();
    clamped.process_measurement(&late).unwrap();
    assert_eq!(clamped.previous_timestamp(), 1_000_000);
    assert_eq!(clamped.cached_dt(), Some(0.0));
}

#[test]
fn text_log_lines_drive_the_filter() {
    let log = "\
L\t3.122427e-01\t5.803398e-01\t1477010443000000\t6.000000e-01\t6.000000e-01\t5.199937e+00\t0
R\t1.014892e+00\t5.543292e-01\t4.892807e+00\t1477010443050000\t8.599968e-01\t6.000449e-01\t5.199747e+00\t1.796856e-03
L\t1.173848e+00\t4.810729e-01\t1477010443100000\t1.119984e+00\t6.002246e-01\t5.199429e+00\t5.389957e-03";

    let mut ekf = FusionEkf::default();
    for line in log.lines() {
        let pkg = parse_line(line).unwrap();
        ekf.process_measurement(&pkg).unwrap();
    }

    let snapshot = ekf.snapshot().unwrap();
    assert_eq!(snapshot.timestamp, 1_477_010_443_100_000);
    assert_eq!(snapshot.laser_updates, 1);
    assert_eq!(snapshot.radar_updates, 1);
    assert!(snapshot.position.0 > 0.8 && snapshot.position.0 < 1.4);
    assert!(snapshot.covariance_trace < 4.0);
}

#[test]
fn config_file_round_trip() {
    let path = std::env::temp_dir().join(format!(
        "fusion_tracker_config_{}.json",
        std::process::id()
    ));
    std::fs::write(
        &path,
        r#"{ "process_noise_ax": 4.0, "timestamp_policy": "clamp", "covariance_update": "joseph" }"#,
    )
    .unwrap();

    let config = FusionConfig::from_json_file(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(config.process_noise_ax, 4.0);
    assert_eq!(config.process_noise_ay, 9.0);
    assert_eq!(config.timestamp_policy, TimestampPolicy::Clamp);
    assert!(FusionEkf::new(config).is_ok());
}
