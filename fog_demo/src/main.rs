//! Volumetric fog demo
//!
//! Builds a small scene against the headless backend and steps a few
//! frames, logging visible counts, the evaluated feature mask, and the
//! dispatch activity per frame. Run with `RUST_LOG=debug` for the
//! allocation-level detail.

use volumetric_engine::prelude::*;

struct FogDemo {
    backend: HeadlessBackend,
    pipeline: VolumetricPipeline,
    quality: QualitySettings,
    environment: EnvironmentSettings,
}

impl FogDemo {
    fn new() -> Result<Self, PipelineError> {
        let quality = QualitySettings {
            far_range: 100.0,
            ..Default::default()
        };
        let environment = EnvironmentSettings::default();

        let mut backend = HeadlessBackend::new();
        let mut pipeline = VolumetricPipeline::new();
        pipeline.initialize(&mut backend, &quality)?;

        Ok(Self { backend, pipeline, quality, environment })
    }

    fn build_scene(&mut self) {
        log::info!("Registering scene lights and volumes...");
        let registry = self.pipeline.registry_mut();

        registry.register_directional(
            DirectionalLight::new(
                Vec3::new(-0.3, -1.0, 0.2),
                Vec3::new(1.0, 0.96, 0.88),
                1.2,
            )
            .with_shadows(0.9),
        );

        registry.register_spot(
            SpotLight::new(
                Vec3::new(0.0, 4.0, 8.0),
                Vec3::new(0.0, -1.0, 0.2),
                Vec3::new(0.9, 0.85, 0.6),
                3.0,
                12.0,
                std::f32::consts::FRAC_PI_4,
            )
            .with_shadows(0.7),
        );

        // street lamps down the view axis; the farthest is outside the
        // culling range and never reaches the GPU
        for z in [6.0, 18.0, 40.0, 160.0] {
            registry.register_point(PointLight::new(
                Vec3::new(2.0, 3.0, z),
                Vec3::new(1.0, 0.7, 0.4),
                2.0,
                8.0,
            ));
        }

        registry.register_volume(
            FogVolume::new(BoundingSphere::new(Vec3::new(0.0, 1.0, 15.0), 10.0), 0.4)
                .with_noise(0.5),
        );
        registry.register_volume(FogVolume::new(
            BoundingSphere::new(Vec3::new(0.0, 0.5, 45.0), 20.0),
            0.15,
        ));
    }

    fn run(&mut self, frames: u64) -> Result<(), PipelineError> {
        let camera = CameraState::perspective(
            Vec3::new(0.0, 1.7, 0.0),
            Vec3::new(0.0, 0.0, 1.0),
            60.0,
            16.0 / 9.0,
            0.1,
            1000.0,
        );

        for _ in 0..frames {
            let before = self.backend.dispatches().len();
            let stats = self.pipeline.render_frame(
                &mut self.backend,
                &camera,
                &self.quality,
                &self.environment,
            )?;
            let dispatched = self.backend.dispatches().len() - before;

            log::info!(
                "frame {}: kernel {} | visible dir {} spot {} point {} vol {} | {} dispatches{}",
                stats.frame_index,
                stats.kernel_id,
                stats.visible_directional,
                stats.visible_spot,
                stats.visible_point,
                stats.visible_volumes,
                dispatched,
                if stats.passthrough { " (pass-through)" } else { "" },
            );
            log::info!("frame {}: flags {:?}", stats.frame_index, stats.flags);
        }

        log::info!(
            "done: {} dispatches total, {} buffers and {} textures live",
            self.backend.dispatches().len(),
            self.backend.live_buffer_count(),
            self.backend.live_texture_count(),
        );
        Ok(())
    }

    fn shutdown(&mut self) {
        self.pipeline.uninitialize(&mut self.backend);
        log::info!(
            "shutdown: {} buffers and {} textures live",
            self.backend.live_buffer_count(),
            self.backend.live_texture_count(),
        );
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Starting volumetric fog demo...");

    let mut demo = FogDemo::new()?;
    demo.build_scene();
    demo.run(4)?;
    demo.shutdown();
    Ok(())
}
