use std::any::TypeId;
use std::collections::BTreeMap;

use aquarium_sim::fish::behavior::{handler, StateCtx};
use aquarium_sim::fish::components::*;
use aquarium_sim::fish::factory::{spawn_tank, FishFactory};
use aquarium_sim::fish::motion::{integrate, update_avoidance, MoveInput};
use aquarium_sim::fish::pipeline::{apply_overrides, Proposals};
use aquarium_sim::fish::view::FishView;
use aquarium_sim::{AudioCue, CueRecorder, EntityId, SimConfig, SimRng, Simulation, World};
use glam::Vec2;

/// Owned pieces for driving handlers and factories outside a `Simulation`.
struct Rig {
    config: SimConfig,
    world: World,
    rng: SimRng,
    audio: CueRecorder,
    tank: EntityId,
}

impl Rig {
    fn new(config: SimConfig) -> Self {
        let mut world = World::new();
        let tank = spawn_tank(&mut world, "test");
        Self {
            config,
            world,
            rng: SimRng::seeded(42),
            audio: CueRecorder::new(),
            tank,
        }
    }

    fn factory(&mut self) -> (FishFactory<'_>, &mut World) {
        (
            FishFactory {
                config: &self.config,
                rng: &mut self.rng,
                audio: &mut self.audio,
                tank: self.tank,
            },
            &mut self.world,
        )
    }

    /// A goldfish with an exact (unjittered) behavior table.
    fn fish(&mut self, x: f32, y: f32, tuning: &[(&str, f32)]) -> EntityId {
        let (mut factory, world) = self.factory();
        let id = factory
            .create_fish(world, "goldfish", x, y)
            .expect("goldfish is configured");
        self.world
            .add_component(id, tuning.iter().copied().collect::<BehaviorTuning>());
        id
    }

    fn ctx(&mut self, dt: f32) -> StateCtx<'_> {
        StateCtx {
            config: &self.config,
            world: &mut self.world,
            rng: &mut self.rng,
            audio: &mut self.audio,
            dt,
        }
    }
}

fn recorded_sim(config: SimConfig) -> (Simulation, CueRecorder) {
    let recorder = CueRecorder::new();
    let sim = Simulation::with_parts(config, SimRng::seeded(7), Box::new(recorder.clone()));
    (sim, recorder)
}

#[derive(Debug, PartialEq)]
struct Marker(u32);
struct Ballast;

#[test]
fn store_queries_track_live_holders_in_creation_order() {
    let mut world = World::new();
    let mut rng = SimRng::seeded(99);
    let mut live: Vec<EntityId> = Vec::new();
    let mut holders: BTreeMap<EntityId, u32> = BTreeMap::new();

    for step in 0..500u32 {
        let roll = rng.unit();
        if roll < 0.3 || live.is_empty() {
            let id = world.create_entity();
            world.add_component(id, Ballast);
            live.push(id);
        } else if roll < 0.6 {
            let Some(&id) = rng.pick(&live) else { continue };
            world.add_component(id, Marker(step));
            holders.insert(id, step);
        } else if roll < 0.8 {
            let Some(&id) = rng.pick(&live) else { continue };
            world.remove_component::<Marker>(id);
            holders.remove(&id);
        } else {
            let Some(&id) = rng.pick(&live) else { continue };
            world.destroy_entity(id);
            live.retain(|e| *e != id);
            holders.remove(&id);
        }

        let expected: Vec<EntityId> = holders.keys().copied().collect();
        let queried: Vec<EntityId> = world.query::<(Marker,)>().collect();
        assert_eq!(queried, expected, "step {step}");
        let by_type: Vec<EntityId> = world.entities_with(&[TypeId::of::<Marker>()]).collect();
        assert_eq!(by_type, expected);
        for (id, value) in &holders {
            assert_eq!(world.get_component::<Marker>(*id), Some(&Marker(*value)));
        }
        assert_eq!(world.len(), live.len());
    }

    for id in live.clone() {
        world.destroy_entity(id);
    }
    assert_eq!(world.query::<(Ballast,)>().count(), 0);
    assert!(world.is_empty());
}

#[test]
fn hunger_stays_within_bounds_over_many_ticks() {
    let (mut sim, _) = recorded_sim(SimConfig::default());
    let fish = sim.populate(4).expect("populate");
    for (i, id) in fish.iter().enumerate() {
        if let Some(hunger) = sim.world_mut().get_component_mut::<Hunger>(*id) {
            hunger.hunger = i as f32 * 25.0;
            hunger.rate = 25.0;
        }
    }

    for step in 0..300 {
        let dt = if step % 3 == 0 { 0.0 } else { 0.05 * (step % 7) as f32 };
        sim.tick(dt);
        for id in &fish {
            let h = sim.world().get_component::<Hunger>(*id).expect("hunger");
            assert!(h.hunger >= 0.0 && h.hunger <= h.max, "hunger {}", h.hunger);
        }
    }
}

#[test]
fn starvation_ends_in_a_single_death() {
    let (mut sim, recorder) = recorded_sim(SimConfig::default());
    let fish = sim.create_fish("goldfish", 400.0, 200.0).expect("fish");
    sim.world_mut()
        .add_component(fish, [("health_starve_factor", 0.4)].into_iter().collect::<BehaviorTuning>());
    if let Some(hunger) = sim.world_mut().get_component_mut::<Hunger>(fish) {
        hunger.hunger = 0.0;
    }

    let mut ticks = 0;
    while !sim.world().has_component::<DeadFlag>(fish) {
        sim.tick(0.1);
        ticks += 1;
        let health = sim.world().get_component::<Health>(fish).expect("health");
        assert!(health.value >= 0.0);
        assert!(ticks < 200, "fish never starved");
    }

    assert_eq!(sim.world().get_component::<Health>(fish).map(|h| h.value), Some(0.0));
    assert_eq!(sim.world().get_component::<Age>(fish).map(|a| a.stage), Some(LifeStage::Dead));
    assert_eq!(sim.world().get_component::<Brain>(fish).map(|b| b.state), Some(BehaviorState::Dead));

    for _ in 0..30 {
        sim.tick(0.1);
    }
    assert_eq!(recorder.count(AudioCue::Death), 1);
    assert_eq!(sim.census().dead, 1);
}

#[test]
fn coinciding_death_causes_play_one_cue() {
    let (mut sim, recorder) = recorded_sim(SimConfig::default());
    let fish = sim.create_fish("goldfish", 400.0, 200.0).expect("fish");
    let world = sim.world_mut();
    world.add_component(fish, [("health_starve_factor", 50.0)].into_iter().collect::<BehaviorTuning>());
    if let Some(hunger) = world.get_component_mut::<Hunger>(fish) {
        hunger.hunger = 0.0;
    }
    if let Some(age) = world.get_component_mut::<Age>(fish) {
        age.lifespan = 1.0;
        age.age = 0.95;
    }

    sim.tick(0.1);
    assert!(sim.world().has_component::<DeadFlag>(fish));
    assert_eq!(sim.world().get_component::<Brain>(fish).map(|b| b.state), Some(BehaviorState::Dead));
    for _ in 0..10 {
        sim.tick(0.1);
    }
    assert_eq!(recorder.count(AudioCue::Death), 1);
}

#[test]
fn egg_hatches_on_the_first_tick_past_its_duration() {
    let mut config = SimConfig::default();
    config.aging.egg_duration_sec = Some(0.5);
    let (mut sim, recorder) = recorded_sim(config);
    let egg = sim.spawn_egg_at(300.0, 50.0, Some("goldfish")).expect("egg");
    assert_eq!(recorder.count(AudioCue::PelletDrop), 1);
    assert_eq!(sim.world().get_component::<Velocity>(egg).map(|v| v.0), Some(Vec2::ZERO));

    for _ in 0..3 {
        sim.tick(0.125);
        let age = *sim.world().get_component::<Age>(egg).expect("age");
        assert_eq!(age.stage, LifeStage::Egg);
        assert_eq!(sim.world().get_component::<Brain>(egg).map(|b| b.state), Some(BehaviorState::Egg));
        assert!(sim.world().has_component::<AffectedByGravity>(egg));
    }

    sim.tick(0.125);
    let age = *sim.world().get_component::<Age>(egg).expect("age");
    assert_eq!(age.stage, LifeStage::Juvenile);
    assert_eq!(age.age, 0.0);
    assert!(!sim.world().has_component::<AffectedByGravity>(egg));

    // The hatch tick commits Idle and runs its enter, nothing more.
    let brain = sim.world().get_component::<Brain>(egg).expect("brain").clone();
    assert_eq!(brain.state, BehaviorState::Idle);
    assert_eq!(brain.state_timer, 0.0);
    assert!(matches!(brain.working, StateWorking::Idle(_)));
    assert!(sim.pipeline().has_entered(egg, BehaviorState::Idle));

    sim.tick(0.125);
    assert_eq!(sim.world().get_component::<Age>(egg).map(|a| a.age), Some(0.125));
}

#[test]
fn dead_beats_egg_in_overrides() {
    let mut rig = Rig::new(SimConfig::default());
    let fish = rig.fish(200.0, 200.0, &[]);
    rig.world.add_component(fish, DeadFlag);
    if let Some(age) = rig.world.get_component_mut::<Age>(fish) {
        age.stage = LifeStage::Egg;
    }

    let mut proposals = Proposals::new();
    proposals.insert(fish, Some(BehaviorState::Cruise));
    apply_overrides(&rig.world, &mut proposals);
    assert_eq!(proposals[&fish], Some(BehaviorState::Dead));
}

#[test]
fn cruise_leaves_for_idle_by_the_crossing_tick() {
    let mut rig = Rig::new(SimConfig::default());
    let fish = rig.fish(
        200.0,
        200.0,
        &[
            ("cruise_min_time", 0.05),
            ("cruise_max_time", 0.06),
            ("transition_to_idle_chance", 0.0),
        ],
    );
    let cruise = handler(BehaviorState::Cruise);
    let mut view = FishView::load(&rig.world, fish).expect("fish view");
    cruise.enter(&mut view, &mut rig.ctx(0.025));

    let mut proposals = Vec::new();
    for _ in 0..3 {
        proposals.push(cruise.update(&mut view, &mut rig.ctx(0.025)));
    }
    assert_eq!(proposals[..2], [None, None]);
    assert_eq!(proposals[2], Some(BehaviorState::Idle));
    assert!(view.brain.state_timer >= 0.06);
}

#[test]
fn cruise_leaves_for_idle_when_the_timer_lands_on_max() {
    for (dt, ticks) in [(0.06_f32, 1usize), (0.03, 2)] {
        let mut rig = Rig::new(SimConfig::default());
        let fish = rig.fish(
            200.0,
            200.0,
            &[
                ("cruise_min_time", 0.05),
                ("cruise_max_time", 0.06),
                ("transition_to_idle_chance", 0.0),
            ],
        );
        let cruise = handler(BehaviorState::Cruise);
        let mut view = FishView::load(&rig.world, fish).expect("fish view");
        cruise.enter(&mut view, &mut rig.ctx(dt));

        let proposals: Vec<_> = (0..ticks)
            .map(|_| cruise.update(&mut view, &mut rig.ctx(dt)))
            .collect();
        assert_eq!(proposals.last(), Some(&Some(BehaviorState::Idle)), "dt {dt}");
        assert!(proposals[..ticks - 1].iter().all(Option::is_none));
    }
}

#[test]
fn chase_food_eats_a_pellet_at_the_mouth() {
    let mut config = SimConfig::default();
    config.pellets.nutrition = 20.0;
    let mut rig = Rig::new(config);
    let fish = rig.fish(100.0, 100.0, &[("food_seek_threshold", 0.8)]);
    rig.world.add_component(
        fish,
        Hunger {
            hunger: 40.0,
            rate: 0.5,
            max: 100.0,
        },
    );
    let pellet = {
        let (mut factory, world) = rig.factory();
        factory.spawn_pellet(world, 150.0, 112.0)
    };

    let chase = handler(BehaviorState::ChaseFood);
    let mut view = FishView::load(&rig.world, fish).expect("fish view");
    view.brain.state = BehaviorState::ChaseFood;
    chase.enter(&mut view, &mut rig.ctx(1.0 / 60.0));
    let next = chase.update(&mut view, &mut rig.ctx(1.0 / 60.0));
    view.write_back(&mut rig.world);

    assert_eq!(next, Some(BehaviorState::LookForFood));
    assert_eq!(rig.world.get_component::<Hunger>(fish).map(|h| h.hunger), Some(60.0));
    assert!(!rig.world.contains(pellet));
    assert_eq!(rig.world.query::<(FoodPellet,)>().count(), 0);
    assert_eq!(rig.audio.count(AudioCue::Bite), 1);
}

#[test]
fn avoidance_pushes_off_the_left_wall() {
    let mut rig = Rig::new(SimConfig::default());
    assert_eq!(rig.config.balancing.avoidance_margin, 20.0);
    let fish = rig.fish(5.0, 300.0, &[]);
    rig.world.add_component(fish, Velocity::new(-30.0, 4.0));

    update_avoidance(&mut rig.world, &rig.config);
    let steer = rig.world.get_component::<SteeringIntent>(fish).expect("steering").0;
    assert!(steer.x > 0.0, "steering {steer:?} points into the wall");
}

#[test]
fn heading_never_turns_faster_than_turn_speed() {
    let mut rng = SimRng::seeded(1234);
    let motion = MotionParams::new(60.0, 400.0, 3.0, 2.5);
    let dt = 1.0 / 60.0;
    let max_turn = motion.turn_speed * dt;

    for _ in 0..2_000 {
        let vel = Vec2::from_angle(rng.range(-3.1, 3.1)) * rng.range(1.0, 60.0);
        let input = MoveInput {
            pos: Vec2::new(rng.range(0.0, 1000.0), rng.range(0.0, 600.0)),
            vel,
            target: Vec2::new(rng.range(0.0, 1000.0), rng.range(0.0, 600.0)),
            steering: Vec2::new(rng.range(-0.25, 0.25), rng.range(-0.25, 0.25)),
            desired_speed: rng.range(0.0, 120.0),
            noise: Vec2::ZERO,
        };
        let (_, new_vel) = integrate(input, &motion, 0.995, dt);
        if new_vel.length() < 1e-4 {
            continue;
        }
        let turned = vel.angle_between(new_vel).abs();
        assert!(turned <= max_turn + 1e-4, "turned {turned} > {max_turn}");
    }
}
