#![allow(dead_code)]
use std::cell::RefCell;
use std::io::Cursor;

use chrono::{NaiveDate, NaiveDateTime};
use snaps_cli::api::{ApiError, DrinkApi, Reply, ServerFailure};
use snaps_cli::chart::ChartSize;
use snaps_cli::models::{DrinkRecord, Event, EventSummary, User};
use snaps_cli::session::{Session, SessionOptions};
use snaps_cli::ui::LineConsole;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Login(String),
    ListEvents,
    GetEvent(u64),
    CreateEvent(String),
    JoinEvent(u64),
    RecordDrink(u64),
    ListUsers,
}

/// In-memory stand-in for the snapsecounter service.
pub struct FakeApi {
    pub username: String,
    pub password: String,
    /// Id of the logged in user; drinks are attributed to it.
    pub me: u64,
    pub events: RefCell<Vec<Event>>,
    pub users: Vec<User>,
    pub next_id: RefCell<u64>,
    pub calls: RefCell<Vec<Call>>,
    pub reject_drinks: Option<String>,
    pub broken_users: bool,
    token: Option<String>,
}

impl FakeApi {
    pub fn new(events: Vec<Event>) -> Self {
        FakeApi {
            username: "alice".into(),
            password: "secret".into(),
            me: 1,
            events: RefCell::new(events),
            users: vec![user(1, "alice"), user(2, "bob")],
            next_id: RefCell::new(42),
            calls: RefCell::new(Vec::new()),
            reject_drinks: None,
            broken_users: false,
            token: None,
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    fn log(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }

    fn not_found(id: u64) -> ServerFailure {
        ServerFailure {
            message: format!("no event {id}"),
        }
    }
}

impl DrinkApi for FakeApi {
    fn login(&mut self, username: &str, password: &str) -> Result<String, ApiError> {
        self.log(Call::Login(username.to_string()));
        if username == self.username && password == self.password {
            let token = format!("token-{username}");
            self.token = Some(token.clone());
            Ok(token)
        } else {
            Err(ApiError::Auth)
        }
    }

    fn list_events(&self) -> Result<Reply<Vec<EventSummary>>, ApiError> {
        self.log(Call::ListEvents);
        Ok(Reply::Ok(
            self.events
                .borrow()
                .iter()
                .map(|e| EventSummary {
                    id: e.id,
                    name: e.name.clone(),
                })
                .collect(),
        ))
    }

    fn get_event(&self, id: u64) -> Result<Reply<Event>, ApiError> {
        self.log(Call::GetEvent(id));
        Ok(match self.events.borrow().iter().find(|e| e.id == id) {
            Some(event) => Reply::Ok(event.clone()),
            None => Reply::Failed(Self::not_found(id)),
        })
    }

    fn create_event(&self, name: &str) -> Result<Reply<u64>, ApiError> {
        self.log(Call::CreateEvent(name.to_string()));
        let id = *self.next_id.borrow();
        *self.next_id.borrow_mut() += 1;
        self.events.borrow_mut().push(Event {
            id,
            name: name.to_string(),
            drinks: Vec::new(),
        });
        Ok(Reply::Ok(id))
    }

    fn join_event(&self, id: u64) -> Result<Reply<()>, ApiError> {
        self.log(Call::JoinEvent(id));
        if self.events.borrow().iter().any(|e| e.id == id) {
            Ok(Reply::Ok(()))
        } else {
            Ok(Reply::Failed(Self::not_found(id)))
        }
    }

    fn record_drink(&self, event_id: u64) -> Result<Reply<()>, ApiError> {
        self.log(Call::RecordDrink(event_id));
        if let Some(message) = &self.reject_drinks {
            return Ok(Reply::Failed(ServerFailure {
                message: message.clone(),
            }));
        }
        let mut events = self.events.borrow_mut();
        let Some(event) = events.iter_mut().find(|e| e.id == event_id) else {
            return Ok(Reply::Failed(Self::not_found(event_id)));
        };
        let minute = event.drinks.len() as u32;
        event.drinks.push(drink(self.me, at(21, minute)));
        Ok(Reply::Ok(()))
    }

    fn list_users(&self) -> Result<Reply<Vec<User>>, ApiError> {
        self.log(Call::ListUsers);
        if self.broken_users {
            return Err(ApiError::InvalidToken);
        }
        Ok(Reply::Ok(self.users.clone()))
    }
}

pub fn at(h: u32, m: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2019, 6, 21)
        .unwrap()
        .and_hms_opt(h, m, 0)
        .unwrap()
}

pub fn user(id: u64, username: &str) -> User {
    User {
        id,
        username: username.to_string(),
    }
}

pub fn drink(user: u64, datetime: NaiveDateTime) -> DrinkRecord {
    DrinkRecord { user, datetime }
}

pub fn event(id: u64, name: &str, drinks: Vec<DrinkRecord>) -> Event {
    Event {
        id,
        name: name.to_string(),
        drinks,
    }
}

pub fn plain_options() -> SessionOptions {
    SessionOptions {
        test_mode: false,
        color: false,
        chart_size: Some(ChartSize {
            width: 70,
            height: 20,
        }),
    }
}

/// Run a session against `api` with scripted `input`; returns everything
/// printed and the session result.
pub fn run_session(
    api: &mut FakeApi,
    input: &str,
    options: SessionOptions,
) -> (anyhow::Result<()>, String) {
    let mut console = LineConsole::new(Cursor::new(input.to_string()), Vec::new());
    let result = Session::new(api, &mut console, options).run();
    let output = String::from_utf8(console.into_output()).unwrap();
    (result, output)
}
