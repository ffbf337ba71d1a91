use glam::Vec2;
use tracing_subscriber::EnvFilter;

use sparkrun_core::render::{CommandRecorder, FixedCamera, Rgba};
use sparkrun_platformer::{
    CollectionStats, DeviceClass, EffectOverlay, GameEvent, GameSession, ItemKind, Modifier,
    Platform, PlatformEffectKind, PlatformId, PlatformerConfig,
};

/// 60 fps frame step.
const FRAME_MS: f64 = 1000.0 / 60.0;
const RUN_FRAMES: u32 = 900;
/// Base walking speed, world units per second.
const WALK_SPEED: f32 = 3.0;
const SEED: u64 = 0x5eed;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = PlatformerConfig::load();
    let overlay_tuning = config.overlay.clone();
    let mut session = GameSession::with_seed(config, DeviceClass::Desktop, SEED);

    let mut overlay = EffectOverlay::attach(session.bus(), overlay_tuning);
    let mut stats = CollectionStats::attach(session.bus());
    session.subscribe(|event| match event {
        GameEvent::EffectAdded(e) => {
            tracing::info!(kind = %e.kind, duration = e.duration, "Effect added")
        },
        GameEvent::EffectRemoved(e) => tracing::info!(kind = %e.kind, "Effect removed"),
        GameEvent::ItemCollected(c) => {
            tracing::info!(kind = ?c.kind, name = %c.name, "Item collected")
        },
    });

    build_level(&mut session);

    let mut camera = FixedCamera::new(Vec2::ZERO, 32.0, Vec2::new(960.0, 540.0));
    let mut recorder = CommandRecorder::new();
    session.player_mut().set_center(Vec2::new(0.5, 4.5));

    session.set_initializing(true);
    session.update(FRAME_MS);
    session.set_initializing(false);

    for frame in 0..RUN_FRAMES {
        let speed = WALK_SPEED * session.effects().modifiers().get(Modifier::Speed);
        session.player_mut().x += speed * (FRAME_MS / 1000.0) as f32;
        session.update(FRAME_MS);
        overlay.poll(session.now());
        stats.poll();

        camera.look_at(session.player().center());
        session.render(&mut recorder, &camera);
        overlay.render(&mut recorder, Vec2::new(16.0, 16.0));
        if frame % 120 == 0 {
            tracing::debug!(
                frame,
                now = session.now(),
                draws = recorder.paint_count(),
                overlay = overlay.entries().len(),
                particles = session.particles().len(),
                "Frame"
            );
        }
        recorder.clear();
    }

    for (kind, count) in stats.counts() {
        tracing::info!(?kind, count, "Collected");
    }
    tracing::info!(
        total = stats.total(),
        remaining_items = session.items().len(),
        player_x = session.player().x,
        "Run complete"
    );
}

/// A flat run of platforms with a pickup above every other one.
fn build_level(session: &mut GameSession) {
    let kinds = ItemKind::ALL;
    for i in 0..12u32 {
        let id: PlatformId = i + 1;
        let x = i as f32 * 4.0;
        session.add_platform(Platform {
            id,
            x,
            y: 5.0,
            width: 3.5,
            height: 0.5,
        });
        if i % 2 == 0 {
            let kind = kinds[(i as usize / 2) % kinds.len()];
            session
                .spawn_item(kind, x + 1.0, 4.0)
                .set_lifespan(Some(20_000.0));
            session.platform_effects_mut().add_effect(
                id,
                PlatformEffectKind::glow(kind.behavior().colors().1),
                None,
            );
        }
    }
    let pulsed: [PlatformId; 3] = [3, 7, 11];
    session.platform_effects_mut().add_effect(
        pulsed,
        PlatformEffectKind::pulse(Rgba::from_rgb8(0xff, 0xeb, 0x3b)),
        Some(8000.0),
    );
    let finish: PlatformId = 12;
    session
        .platform_effects_mut()
        .add_effect(finish, PlatformEffectKind::rainbow(), None);
}
