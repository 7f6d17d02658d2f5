use brane_space::consts::*;
use brane_space::sim::{Body, Entity, EntityId, PulseParams, SimContext, TickInput, Wavelet, World, run_frame};
use brane_space::{GridQuality, Settings};
use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use std::collections::HashSet;

fn assert_lists_consistent(world: &World) {
    let live: HashSet<EntityId> = world.entities().map(|e| e.id).collect();
    for list in [world.updatables(), world.drawables(), world.collectables(), world.collidables()] {
        let unique: HashSet<EntityId> = list.iter().copied().collect();
        assert_eq!(unique.len(), list.len(), "duplicate membership");
        assert!(list.iter().all(|id| live.contains(id)), "stale id in membership list");
    }
    assert_eq!(world.updatables().len(), live.len());
}

#[test]
fn test_deferred_destruction_of_collidables() {
    let mut world = World::empty(Settings::default()).unwrap();
    let mut rng = Pcg32::seed_from_u64(3);
    let ids: Vec<EntityId> = (0..10)
        .map(|i| {
            let id = world.next_entity_id();
            // spaced well beyond contact range
            let pos = Vec2::new(30.0 + 55.0 * i as f32, 300.0);
            world.spawn(Entity::asteroid(id, pos, Vec2::ZERO, &mut rng).unwrap())
        })
        .collect();

    for id in [ids[1], ids[4], ids[8]] {
        world.schedule_destruction(id);
    }
    assert_eq!(world.collidables().len(), 10);
    world.apply_destruction();

    assert_eq!(world.updatables().len(), 7);
    assert_eq!(world.drawables().len(), 7);
    assert_eq!(world.collidables().len(), 7);
    assert_lists_consistent(&world);

    // a collision pass over the survivors touches nothing
    world.step_collisions(FRAME_DT);
    assert_eq!(world.collidables().len(), 7);
}

#[test]
fn test_verlet_free_flight_round_trip() {
    let ctx = SimContext::toroidal(WORLD_SIZE).unwrap();
    let r0 = Vec2::new(120.0, 480.0);
    // binary-exact increments so the comparison is tight
    let v0 = Vec2::new(0.0625, -0.046875);
    let mut body = Body::new(3.0, 0.0).unwrap().with_position(r0).with_velocity(v0);
    let (n, dt) = (500, 8.0);
    for _ in 0..n {
        body.integrate(dt, Vec2::ZERO, &ctx);
    }
    let expected = ctx.wrap(r0 + v0 * n as f32 * dt);
    assert!(ctx.displacement(body.pos, expected).length() < 1e-3);
    assert_eq!(body.vel, v0);
}

#[test]
fn test_pulse_ring_integral_is_conserved() {
    let ctx = SimContext::open();
    let params = PulseParams::default();
    let reference = 4.0 * params.amplitude * params.wavelength;

    for front in [200.0f32, 400.0, 800.0] {
        let t = front / params.speed;
        let wave = Wavelet::pulse(Vec2::ZERO, params, 2000.0).unwrap().with_lifetime(t);
        let samples = 4000;
        let step = params.wavelength / samples as f32;
        let inner = front - params.wavelength;
        let integral: f32 = (0..samples)
            .map(|i| {
                let d = inner + (i as f32 + 0.5) * step;
                wave.intensity_at(Vec2::new(d, 0.0), &ctx).abs() * std::f32::consts::TAU * d * step
            })
            .sum();
        // exact value is 4AL(1 - L/(2vt)), approaching 4AL as the ring grows
        assert!(
            (integral / reference - 1.0).abs() < 0.05,
            "front {front}: {integral} vs {reference}"
        );
    }
}

#[test]
fn test_default_run_stays_consistent() {
    let mut world = World::new(Settings {
        seed: 11,
        grid_quality: GridQuality::Low,
        ..Settings::default()
    })
    .unwrap();
    let input = TickInput {
        wavegen: true,
        rotate: 1.0,
        ..Default::default()
    };

    for _ in 0..120 {
        run_frame(&mut world, &input, FRAME_DT, 2).unwrap();
        assert!(world.pending_destruction().is_empty());
        assert_lists_consistent(&world);
        for e in world.entities() {
            assert!(e.body.pos.is_finite());
            assert!(e.body.pos.cmpge(Vec2::ZERO).all() && e.body.pos.cmplt(Vec2::splat(WORLD_SIZE)).all());
        }
        if world.is_game_over() {
            break;
        }
    }
    assert!(world.steps > 0);
    assert!(world.brane().intensity().iter().all(|i| i.is_finite()));
}
