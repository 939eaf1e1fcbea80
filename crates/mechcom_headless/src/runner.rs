//! Headless game runner implementation.
//!
//! The runner owns one simulation and answers every protocol line with one
//! or more responses. Commands are handled synchronously in arrival order,
//! so a script replays identically from run to run.

use std::io::{self, BufRead, Write};

use mechcom_core::simulation::Simulation;
use tracing::{debug, info, warn};

use crate::protocol::{outcome_entity, Command, GameResult, Response, StateView};
use crate::scenario::{Scenario, ScenarioError};

/// Headless runner configuration.
#[derive(Debug, Clone, Default)]
pub struct HeadlessConfig {
    /// Output state after every `tick` command (vs only on query).
    pub auto_state_output: bool,
    /// Scenario file to load on startup.
    pub scenario_path: Option<String>,
}

/// Headless runner for scripted or AI-controlled play.
pub struct HeadlessRunner {
    sim: Simulation,
    config: HeadlessConfig,
    finished: bool,
}

impl HeadlessRunner {
    /// Create a runner around an existing simulation.
    pub fn new(sim: Simulation, config: HeadlessConfig) -> Self {
        Self {
            sim,
            config,
            finished: false,
        }
    }

    /// Create a runner from configuration, loading the scenario it names or
    /// the standard skirmish.
    pub fn with_config(config: HeadlessConfig) -> Result<Self, ScenarioError> {
        let scenario = match &config.scenario_path {
            Some(path) => {
                let scenario = Scenario::load(path)?;
                info!("Loaded scenario: {}", scenario.name);
                scenario
            }
            None => Scenario::skirmish(),
        };
        Ok(Self::new(scenario.build()?, config))
    }

    /// The running simulation.
    pub fn simulation(&self) -> &Simulation {
        &self.sim
    }

    fn state(&self) -> Response {
        Response::State(StateView::from_snapshot(
            &self.sim.snapshot(),
            self.sim.state_hash(),
        ))
    }

    /// Handle one command. Returns the responses and whether to stop.
    pub fn handle(&mut self, command: &Command) -> (Vec<Response>, bool) {
        let name = command.name();
        let mut responses = Vec::new();

        match command {
            Command::Tick { count } => {
                for _ in 0..*count {
                    let events = self.sim.tick();
                    if let Some(result) = events.outcome.and_then(GameResult::from_outcome) {
                        info!(tick = self.sim.get_tick(), ?result, "Match decided");
                        self.finished = true;
                        responses.push(Response::GameOver {
                            result,
                            tick: self.sim.get_tick(),
                        });
                    }
                }
                responses.insert(0, Response::ack(name, None, self.sim.money()));
                if self.config.auto_state_output {
                    responses.push(self.state());
                }
            }
            Command::Query => responses.push(self.state()),
            Command::Hash => responses.push(Response::StateHash {
                tick: self.sim.get_tick(),
                hash: self.sim.state_hash(),
            }),
            Command::SetMoney { amount } if *amount < 0 => {
                responses.push(Response::rejected(name, "money cannot be negative"));
            }
            Command::SetMoney { amount } => {
                self.sim.set_money(*amount);
                responses.push(Response::ack(name, None, self.sim.money()));
            }
            Command::Quit => {
                responses.push(Response::Bye);
                return (responses, true);
            }
            _ => {
                let response = match command.to_intent(self.sim.catalog()) {
                    Ok(Some(intent)) => match self.sim.apply(intent) {
                        Ok(outcome) => {
                            Response::ack(name, outcome_entity(&outcome), self.sim.money())
                        }
                        Err(reason) => Response::rejected(name, reason),
                    },
                    Ok(None) => Response::error("command has no simulation intent", Some(name)),
                    Err(e) => Response::error(e.to_string(), Some(name)),
                };
                responses.push(response);
            }
        }

        (responses, false)
    }

    /// Parse and handle one input line.
    pub fn handle_line(&mut self, line: &str) -> (Vec<Response>, bool) {
        let line = line.trim();
        if line.is_empty() {
            return (Vec::new(), false);
        }
        match Command::from_json(line) {
            Ok(command) => {
                debug!(cmd = command.name(), "Command received");
                self.handle(&command)
            }
            Err(e) => {
                warn!("Unparseable command: {e}");
                (vec![Response::error(format!("Invalid command: {e}"), None)], false)
            }
        }
    }

    /// Whether a game-over response has been sent.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Run the protocol loop until `quit` or end of input.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, mut output: W) -> io::Result<()> {
        output.write_all(Response::ready(self.sim.get_tick()).to_json_line().as_bytes())?;
        output.flush()?;

        for line in input.lines() {
            let (responses, quit) = self.handle_line(&line?);
            for response in responses {
                output.write_all(response.to_json_line().as_bytes())?;
            }
            output.flush()?;
            if quit {
                return Ok(());
            }
        }

        info!("Input closed at tick {}", self.sim.get_tick());
        Ok(())
    }
}
