use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::cache::DatasetKey;
use crate::config::EngineConfig;
use crate::dataset::Dataset;
use crate::event::{Event, EventType, Flag, Outcome};
use crate::teams::BRASILEIRAO_2025;

pub const DEMO_SEED: u64 = 2025;
const SQUAD_SIZE: usize = 14;
const FIRST_MATCH_ID: u64 = 1_900_000;

#[derive(Debug, Clone, Copy)]
pub struct DemoSeason {
    pub seed: u64,
    /// Each round pairs all twenty clubs.
    pub rounds: usize,
    pub events_per_team: usize,
}

impl Default for DemoSeason {
    fn default() -> Self {
        Self {
            seed: DEMO_SEED,
            rounds: 6,
            events_per_team: 220,
        }
    }
}

impl DemoSeason {
    /// Raw, unit-scale event log (no team names resolved yet).
    pub fn events(&self) -> Vec<Event> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let clubs: Vec<(u32, &str)> = BRASILEIRAO_2025.to_vec();
        let mut events = Vec::new();
        let mut match_id = FIRST_MATCH_ID;
        for round in 0..self.rounds {
            for (home, away) in round_pairings(clubs.len(), round) {
                for (team_id, name) in [clubs[home], clubs[away]] {
                    for _ in 0..self.events_per_team {
                        events.push(random_event(&mut rng, match_id, team_id, name));
                    }
                }
                match_id += 1;
            }
        }
        events
    }

    pub fn dataset(&self, config: &EngineConfig) -> Dataset {
        let mut seed = b"demo:".to_vec();
        seed.extend_from_slice(&self.seed.to_le_bytes());
        seed.extend_from_slice(&(self.rounds as u64).to_le_bytes());
        seed.extend_from_slice(&(self.events_per_team as u64).to_le_bytes());
        let key = DatasetKey::derive(&seed, config);
        Dataset::from_events(key, self.events(), config)
    }
}

/// Circle-method round robin.
fn round_pairings(teams: usize, round: usize) -> Vec<(usize, usize)> {
    let n = teams - teams % 2;
    if n < 2 {
        return Vec::new();
    }
    let rotating = n - 1;
    let r = round % rotating;
    let slot = |i: usize| if i == 0 { 0 } else { 1 + (i - 1 + r) % rotating };
    (0..n / 2)
        .map(|i| {
            let (a, b) = (slot(i), slot(n - 1 - i));
            if round % 2 == 0 { (a, b) } else { (b, a) }
        })
        .collect()
}

fn random_event(rng: &mut StdRng, match_id: u64, team_id: u32, club: &str) -> Event {
    let roll: f64 = rng.gen_range(0.0..1.0);
    let kind = match roll {
        r if r < 0.52 => EventType::Pass,
        r if r < 0.64 => EventType::Carry,
        r if r < 0.68 => EventType::TakeOn,
        r if r < 0.73 => EventType::Tackle,
        r if r < 0.77 => EventType::Interception,
        r if r < 0.80 => EventType::Foul,
        r if r < 0.84 => EventType::Clearance,
        r if r < 0.90 => EventType::BallRecovery,
        r if r < 0.93 => EventType::Aerial,
        r if r < 0.94 => EventType::OffsidePass,
        r if r < 0.955 => EventType::SavedShot,
        r if r < 0.975 => EventType::MissedShots,
        r if r < 0.982 => EventType::Goal,
        _ => EventType::Challenge,
    };

    let mut event = Event::new(match_id, kind.clone());
    event.team_id = Some(team_id);
    let shirt = rng.gen_range(1..=SQUAD_SIZE);
    event.player_name = Some(format!("{club} {shirt:02}"));

    let (x, y) = match kind {
        EventType::SavedShot | EventType::MissedShots | EventType::Goal => {
            (rng.gen_range(0.70..0.99), rng.gen_range(0.25..0.75))
        }
        _ => (rng.gen_range(0.0..1.0), rng.gen_range(0.0..1.0)),
    };
    event.x = Some(x);
    event.y = Some(y);

    let won = rng.gen_bool(0.6);
    match kind {
        EventType::Pass => {
            let end_x: f64 = (x + rng.gen_range(-0.15..0.30)).clamp(0.0, 1.0);
            let end_y: f64 = (y + rng.gen_range(-0.20..0.20)).clamp(0.0, 1.0);
            event.end_x = Some(end_x);
            event.end_y = Some(end_y);
            let accurate = rng.gen_bool(0.82);
            event.outcome = Some(if accurate {
                Outcome::Successful
            } else {
                Outcome::Unsuccessful
            });
            event.flags.set(Flag::PassAccurate, accurate);
            event.flags.set(Flag::PassInaccurate, !accurate);
            event.flags.set(Flag::ProgressiveAction, end_x - x > 0.18);
            event.flags.set(Flag::LastThirdEntry, x <= 0.67 && end_x > 0.67);
            event.flags.set(Flag::BoxEntry, end_x > 0.83 && (0.21..=0.79).contains(&end_y));
            if accurate && end_x > 0.75 && rng.gen_bool(0.12) {
                event.flags.insert(Flag::KeyPass);
                if rng.gen_bool(0.15) {
                    event.flags.insert(Flag::Assist);
                }
                if rng.gen_bool(0.3) {
                    event.flags.insert(Flag::BigChanceCreated);
                }
            }
            if end_x > 0.8 && rng.gen_bool(0.08) {
                let flag = if accurate {
                    Flag::PassCrossAccurate
                } else {
                    Flag::PassCrossInaccurate
                };
                event.flags.insert(flag);
            }
            if rng.gen_bool(0.02) {
                event.flags.insert(Flag::PassCorner);
                let flag = if accurate {
                    Flag::PassCornerAccurate
                } else {
                    Flag::PassCornerInaccurate
                };
                event.flags.insert(flag);
            }
            event.x_threat = if accurate { rng.gen_range(0.0..0.04) * end_x } else { 0.0 };
        }
        EventType::Carry => {
            let end_x: f64 = (x + rng.gen_range(-0.05..0.15)).clamp(0.0, 1.0);
            event.end_x = Some(end_x);
            event.end_y = Some((y + rng.gen_range(-0.08..0.08)).clamp(0.0, 1.0));
            event.flags.set(Flag::ProgressiveAction, end_x - x > 0.1);
            event.outcome = Some(Outcome::Successful);
        }
        EventType::TakeOn => {
            event.flags.set(Flag::DribbleWon, won);
            event.flags.set(Flag::DribbleLost, !won);
            event.outcome = Some(outcome(won));
        }
        EventType::Tackle => {
            event.flags.set(Flag::TackleWon, won);
            event.flags.set(Flag::TackleLost, !won);
            event.outcome = Some(outcome(won));
        }
        EventType::Interception => {
            event.flags.insert(Flag::InterceptionWon);
            event.outcome = Some(Outcome::Successful);
        }
        EventType::Clearance => {
            event.flags.insert(Flag::ClearanceTotal);
            event.outcome = Some(Outcome::Successful);
        }
        EventType::BallRecovery => {
            event.flags.insert(Flag::BallRecovery);
            event.outcome = Some(Outcome::Successful);
        }
        EventType::Aerial => {
            event.flags.set(Flag::DuelAerialWon, won);
            event.flags.set(Flag::DuelAerialLost, !won);
            event.outcome = Some(outcome(won));
        }
        EventType::Foul => {
            event.flags.insert(Flag::FoulCommitted);
            event.outcome = Some(Outcome::Unsuccessful);
        }
        EventType::SavedShot | EventType::MissedShots | EventType::Goal => {
            event.flags.insert(Flag::IsShot);
            let big = rng.gen_bool(0.15);
            match kind {
                EventType::Goal => {
                    event.flags.insert(Flag::IsGoal);
                    event.flags.insert(Flag::ShotOnTarget);
                    event.flags.set(Flag::BigChanceScored, big);
                }
                EventType::SavedShot => {
                    event.flags.insert(Flag::ShotOnTarget);
                    event.flags.set(Flag::BigChanceMissed, big);
                }
                _ => {
                    event.flags.insert(Flag::ShotOffTarget);
                    event.flags.set(Flag::BigChanceMissed, big);
                }
            }
            event.x_threat = rng.gen_range(0.02..0.3);
        }
        _ => {}
    }
    event
}

fn outcome(won: bool) -> Outcome {
    if won {
        Outcome::Successful
    } else {
        Outcome::Unsuccessful
    }
}

/// Serializes events back to the CSV layout `ingest` reads.
pub fn to_csv(events: &[Event]) -> Result<Vec<u8>, csv::Error> {
    let mut buf = Vec::new();
    let mut writer = csv::Writer::from_writer(&mut buf);
    let mut header: Vec<&str> = vec![
        "matchId",
        "teamId",
        "playerName",
        "type",
        "outcomeType",
        "x",
        "y",
        "endX",
        "endY",
        "xThreat",
    ];
    header.extend(Flag::ALL.iter().map(|f| f.column()));
    writer.write_record(&header)?;

    let opt = |v: Option<f64>| v.map(|v| v.to_string()).unwrap_or_default();
    for event in events {
        let mut record = vec![
            event.match_id.to_string(),
            event.team_id.map(|id| id.to_string()).unwrap_or_default(),
            event.player_name.clone().unwrap_or_default(),
            event.event_type.to_string(),
            event
                .outcome
                .map(|o| o.as_str().to_string())
                .unwrap_or_default(),
            opt(event.x),
            opt(event.y),
            opt(event.end_x),
            opt(event.end_y),
            event.x_threat.to_string(),
        ];
        record.extend(
            Flag::ALL
                .iter()
                .map(|f| if event.has(*f) { "True" } else { "False" }.to_string()),
        );
        writer.write_record(&record)?;
    }
    writer.flush()?;
    drop(writer);
    Ok(buf)
}
