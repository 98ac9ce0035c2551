use renderer::{
    Antialiasing, CameraParams, GridSpec, MeshPlacement, RendererConfig, Rgb, SceneParams,
    WaveParams,
};
use sceneconfig::{AntialiasSetting, SceneConfig};

pub fn map_antialias(setting: Option<AntialiasSetting>) -> Antialiasing {
    match setting {
        None | Some(AntialiasSetting::Auto) => Antialiasing::Auto,
        Some(AntialiasSetting::Off) => Antialiasing::Off,
        Some(other) => other
            .samples()
            .map(Antialiasing::Samples)
            .unwrap_or(Antialiasing::Auto),
    }
}

pub fn scene_params(config: &SceneConfig) -> SceneParams {
    SceneParams {
        grid: GridSpec {
            amount_x: config.grid.amount_x,
            amount_y: config.grid.amount_y,
            separation: config.grid.separation as f32,
        },
        wave: WaveParams {
            amplitude: config.wave.amplitude,
            frequency_x: config.wave.frequency_x,
            frequency_y: config.wave.frequency_y,
            phase_step: config.wave.phase_step,
            time_step: config.wave.time_step,
        },
        camera: CameraParams {
            fov_deg: config.camera.fov_deg as f32,
            near: config.camera.near as f32,
            far: config.camera.far as f32,
            height: config.camera.height as f32,
            distance: config.camera.distance as f32,
            smoothing: config.camera.smoothing as f32,
        },
        mesh: MeshPlacement {
            offset_y: config.mesh.offset_y as f32,
            tilt: config.mesh.tilt as f32,
        },
        color: Rgb::from_hex(config.colors.base.value()),
        background: Rgb::from_hex(config.colors.background.value()),
    }
}

pub fn renderer_config(config: &SceneConfig) -> RendererConfig {
    RendererConfig {
        window_size: (config.window.width, config.window.height),
        target_fps: config
            .render
            .fps
            .filter(|fps| *fps > 0.0)
            .map(|fps| fps as f32),
        antialiasing: map_antialias(config.render.antialias),
        scene: scene_params(config),
    }
}
