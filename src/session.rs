// Interactive session: log in, pick or create an event, then keep asking
// whether the user had a drink and redraw the chart after every answer.
//
// Server-reported failures are printed and the session carries on. Transport
// and decoding errors are returned to the caller.

use anyhow::{bail, Context, Result};
use tracing::{debug, info, warn};

use crate::api::{ApiError, DrinkApi, Reply, ServerFailure};
use crate::chart::{self, ChartSize};
use crate::chooser::{choose, Choice};
use crate::models::{Event, EventSummary};
use crate::ui::Console;

pub const TEST_USERNAME: &str = "test";
pub const TEST_PASSWORD: &str = "test";
pub const TEST_EVENT_NAME: &str = "Test event";

#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    /// Skip credential and event prompts, using fixed test values.
    pub test_mode: bool,
    /// Print the chart with ANSI colours.
    pub color: bool,
    /// Chart size; `None` follows the terminal size on every redraw.
    pub chart_size: Option<ChartSize>,
}

#[derive(Debug)]
enum State {
    LoggingIn,
    ChoosingEvent,
    CreatingEvent,
    JoiningEvent(EventSummary),
    Tracking(Event),
    Done,
}

#[derive(Debug, Clone, Copy)]
enum EventMenu {
    Create,
}

pub struct Session<'a, A: ?Sized, C: ?Sized> {
    api: &'a mut A,
    console: &'a mut C,
    options: SessionOptions,
}

impl<'a, A, C> Session<'a, A, C>
where
    A: DrinkApi + ?Sized,
    C: Console + ?Sized,
{
    pub fn new(api: &'a mut A, console: &'a mut C, options: SessionOptions) -> Self {
        Session {
            api,
            console,
            options,
        }
    }

    /// Run until the user cancels or input ends.
    pub fn run(&mut self) -> Result<()> {
        let mut state = State::LoggingIn;
        loop {
            debug!(?state, "session state");
            state = match state {
                State::LoggingIn => self.log_in()?,
                State::ChoosingEvent => self.choose_event()?,
                State::CreatingEvent => self.create_event()?,
                State::JoiningEvent(summary) => self.join_event(summary)?,
                State::Tracking(event) => self.track(event)?,
                State::Done => return Ok(()),
            };
        }
    }

    fn log_in(&mut self) -> Result<State> {
        loop {
            let (username, password) = if self.options.test_mode {
                (TEST_USERNAME.to_string(), TEST_PASSWORD.to_string())
            } else {
                let Some(username) = self.console.prompt("Username: ")? else {
                    return Ok(State::Done);
                };
                let Some(password) = self.console.prompt_secret("Password: ")? else {
                    return Ok(State::Done);
                };
                (username, password)
            };

            match self.api.login(&username, &password) {
                Ok(_) => {
                    info!(%username, "logged in");
                    return Ok(State::ChoosingEvent);
                }
                Err(ApiError::Auth) => {
                    warn!(%username, "login rejected");
                    self.console
                        .say("Wrong username/password combination. Try again.")?;
                    if self.options.test_mode {
                        bail!("test credentials were rejected");
                    }
                }
                Err(e) => return Err(e).context("login failed"),
            }
        }
    }

    fn choose_event(&mut self) -> Result<State> {
        let events = match self.api.list_events().context("failed to list events")? {
            Reply::Ok(events) => events,
            Reply::Failed(failure) => {
                self.report(&failure)?;
                Vec::new()
            }
        };

        if self.options.test_mode {
            return Ok(match events.into_iter().next() {
                Some(first) => State::JoiningEvent(first),
                None => State::CreatingEvent,
            });
        }

        let names: Vec<&str> = events.iter().map(|e| e.name.as_str()).collect();
        let choice = choose(
            &mut *self.console,
            "Choose event:",
            &names,
            &[('c', EventMenu::Create)],
        )?;
        Ok(match choice {
            Choice::Index(i) => State::JoiningEvent(events[i].clone()),
            Choice::Shortcut(EventMenu::Create) => State::CreatingEvent,
            Choice::Cancelled => State::Done,
        })
    }

    fn create_event(&mut self) -> Result<State> {
        let name = if self.options.test_mode {
            TEST_EVENT_NAME.to_string()
        } else {
            match self.console.prompt("Event name: ")? {
                Some(name) => name.trim().to_string(),
                None => return Ok(State::Done),
            }
        };

        match self.api.create_event(&name).context("failed to create event")? {
            Reply::Ok(id) => {
                info!(id, %name, "created event");
                self.console.say(&format!("Created {name}"))?;
                self.open_event(id)
            }
            Reply::Failed(failure) => self.back_to_menu(&failure),
        }
    }

    fn join_event(&mut self, summary: EventSummary) -> Result<State> {
        match self.api.join_event(summary.id).context("failed to join event")? {
            Reply::Ok(()) => {
                info!(id = summary.id, name = %summary.name, "joined event");
                self.console.say(&format!("Joined {}", summary.name))?;
                self.open_event(summary.id)
            }
            Reply::Failed(failure) => self.back_to_menu(&failure),
        }
    }

    fn open_event(&mut self, id: u64) -> Result<State> {
        match self.api.get_event(id).context("failed to fetch event")? {
            Reply::Ok(event) => Ok(State::Tracking(event)),
            Reply::Failed(failure) => self.back_to_menu(&failure),
        }
    }

    fn track(&mut self, mut event: Event) -> Result<State> {
        loop {
            let users = match self.api.list_users().context("failed to list users")? {
                Reply::Ok(users) => users,
                Reply::Failed(failure) => {
                    self.report(&failure)?;
                    Vec::new()
                }
            };

            let size = self
                .options
                .chart_size
                .unwrap_or_else(ChartSize::from_terminal);
            let rendered = chart::render(&event, &users, size, self.options.color)
                .context("failed to render chart")?;
            self.console.say(&rendered)?;

            let Some(answer) = self.console.prompt("Have you had a drink? [y/N] ")? else {
                return Ok(State::Done);
            };
            if answer.trim().eq_ignore_ascii_case("y") {
                match self.api.record_drink(event.id).context("failed to record drink")? {
                    Reply::Ok(()) => info!(event = event.id, "drink recorded"),
                    Reply::Failed(failure) => self.report(&failure)?,
                }
            } else {
                self.console.say(":(")?;
            }

            match self.api.get_event(event.id).context("failed to refresh event")? {
                Reply::Ok(fresh) => event = fresh,
                Reply::Failed(failure) => self.report(&failure)?,
            }
        }
    }

    fn report(&mut self, failure: &ServerFailure) -> Result<()> {
        warn!(message = %failure.message, "server reported failure");
        self.console
            .say(&format!("Server error: {}", failure.message))?;
        Ok(())
    }

    fn back_to_menu(&mut self, failure: &ServerFailure) -> Result<State> {
        self.report(failure)?;
        if self.options.test_mode {
            bail!("server rejected test event setup: {}", failure.message);
        }
        Ok(State::ChoosingEvent)
    }
}
