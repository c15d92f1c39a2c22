//! Headless simulation loop printing one line per completed wave.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use horde_director_catalog::Catalog;
use horde_director_core::{Event, WaveReport};
use horde_director_system_waves::{DirectorConfig, WaveDirector};

use crate::arena::SimulatedArena;

/// Simulated seconds a single wave may take before the run is abandoned.
const MAX_SECONDS_PER_WAVE: f32 = 900.0;

#[derive(Clone, Copy, Debug)]
pub(crate) struct SimulationOptions {
    pub(crate) waves: u32,
    pub(crate) seed: u64,
    pub(crate) tick: Duration,
    pub(crate) skill: f32,
}

pub(crate) fn run(config: DirectorConfig, catalog: Catalog, options: SimulationOptions) -> Result<()> {
    if options.tick.is_zero() {
        bail!("tick length must be positive");
    }

    let mut director = WaveDirector::with_seed(config, catalog, options.seed)
        .context("director configuration is invalid")?;
    let mut arena = SimulatedArena::new(options.skill);
    let mut events = Vec::new();
    let mut special: Option<String> = None;
    let mut spawned_in_wave = 0_u32;
    let mut completed = 0_u32;
    let deadline = MAX_SECONDS_PER_WAVE * options.waves.max(1) as f32;
    let dt = options.tick.as_secs_f32();

    log::info!(
        "simulating {} waves with seed {:#x} at skill {:.2}",
        options.waves,
        options.seed,
        options.skill
    );

    while completed < options.waves {
        if director.elapsed().as_secs_f32() > deadline {
            bail!(
                "simulation stalled in wave {}: {}",
                director.current_wave(),
                director.wave_info()
            );
        }

        director.tick(options.tick, &mut arena, &mut events);
        let damage = arena.advance(dt);
        director.record_player_damage(damage);

        for event in events.drain(..) {
            match event {
                Event::SpecialWaveStarted { name, .. } => special = Some(name),
                Event::PhaseMessage { text } => println!("    > {text}"),
                Event::EnemySpawned { .. } => spawned_in_wave += 1,
                Event::WaveCompleted { wave, report } => {
                    println!(
                        "{}",
                        summary_line(wave, special.take().as_deref(), spawned_in_wave, &report)
                    );
                    spawned_in_wave = 0;
                    completed += 1;
                    if completed >= options.waves {
                        break;
                    }
                }
                Event::WaveStarted { .. } | Event::PhaseStarted { .. } => {}
            }
        }
    }

    director.stop();
    println!(
        "{} waves in {:.1}s, {} enemies spawned, {} knockdowns, final difficulty {:.2}",
        completed,
        director.elapsed().as_secs_f32(),
        arena.spawned(),
        arena.knockdowns(),
        director.current_difficulty()
    );
    if let Some(averages) = director.performance().averages() {
        println!(
            "rolling averages: clear {:.1}s, health {:.0}%, damage {:.1}, {:.1} kills/min",
            averages.clear_time,
            averages.final_health_pct,
            averages.damage_taken,
            averages.kills_per_minute
        );
    }
    Ok(())
}

fn summary_line(wave: u32, special: Option<&str>, spawned: u32, report: &WaveReport) -> String {
    let label = special.map_or_else(|| "regular".to_owned(), |name| format!("special: {name}"));
    format!(
        "wave {wave:>3} | {label:<28} | spawned {spawned:>3} | kills {:>3} | clear {:>6.1}s | health {:>3.0}% | damage {:>6.1} | performance {:.2} | difficulty {:.2}",
        report.kills,
        report.sample.clear_time,
        report.sample.final_health_pct,
        report.sample.damage_taken,
        report.performance,
        report.difficulty.mean(),
    )
}
