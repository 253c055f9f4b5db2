use nalgebra::Vector3;
use orientation_fusion::{FusionEngine, FusionSettings, ImuFusion, Strategy};

const SAMPLE_PERIOD_NS: u64 = 10_000_000; // 10 ms sample period

fn main() {
    let settings = FusionSettings {
        strategy: Strategy::Orientation,
        filter_coefficient: 0.98,
        ..Default::default()
    };
    let mut fusion = match FusionEngine::with_settings(settings) {
        Ok(fusion) => fusion,
        Err(error) => {
            eprintln!("invalid settings: {}", error);
            return;
        }
    };

    for i in 0..10 {
        // each sensor callback feeds its own reading as it arrives
        let magnetic = Vector3::new(0.0, 30.0, -40.0); // replace this with actual magnetometer data in µT
        let acceleration = Vector3::new(0.0, 0.0, 9.81); // replace this with actual accelerometer data in m/s²
        let angular_velocity = Vector3::new(0.0, 0.0, 0.1); // replace this with actual gyroscope data in rad/s

        fusion.set_magnetic(magnetic);
        fusion.set_acceleration(acceleration);
        fusion.set_gyroscope(angular_velocity, i * SAMPLE_PERIOD_NS);

        if !fusion.has_orientation() {
            continue;
        }

        let degrees = fusion.orientation().to_degrees();
        let linear = fusion.linear_acceleration();

        println!(
            "Azimuth: {:.2}, Pitch: {:.2}, Roll: {:.2}, Linear: ({:.2}, {:.2}, {:.2})",
            degrees.x, degrees.y, degrees.z, linear.x, linear.y, linear.z
        );
    }
}
