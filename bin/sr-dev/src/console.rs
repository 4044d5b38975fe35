//! Line-oriented command interpreter over a [`RegistryService`].
//!
//! Each line names the principal first, so the caller identity always comes
//! from the session input and never from a command argument.

use serde::Serialize;
use serde_json::{json, Value};

use sr_registry::{Address, ExecutionContext, RegistryService, UseCaseError};

const HELP: &str = "\
<principal> subscribe <analyst> <calls>
<principal> unsubscribe <analyst>
<principal> subscription-to <analyst>
<analyst> count
<analyst> subscribers
<analyst> subscriber-at <index>
<analyst> subscription-at <index>
<analyst> subscription-of <subscriber>
<analyst> record-of <subscriber>
audit | help | quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Subscribe { analyst: String, calls: i64 },
    Unsubscribe { analyst: String },
    SubscriptionTo { analyst: String },
    Count,
    Subscribers,
    SubscriberAt { index: i64 },
    SubscriptionAt { index: i64 },
    SubscriptionOf { subscriber: String },
    RecordOf { subscriber: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    Empty,
    Help,
    Audit,
    Quit,
    Run { principal: String, command: Command },
}

pub enum Outcome {
    Reply(Value),
    Skip,
    Quit,
}

pub fn parse_line(line: &str) -> Result<Line, String> {
    let tokens: Vec<&str> = line.split_whitespace().collect();

    match tokens.as_slice() {
        [] => Ok(Line::Empty),
        [first, ..] if first.starts_with('#') => Ok(Line::Empty),
        ["help"] => Ok(Line::Help),
        ["audit"] => Ok(Line::Audit),
        ["quit"] | ["exit"] => Ok(Line::Quit),
        [principal, verb, args @ ..] => {
            let command = parse_command(verb, args)?;
            Ok(Line::Run {
                principal: principal.to_string(),
                command,
            })
        }
        [word] => Err(format!("unknown command '{}'", word)),
    }
}

fn parse_command(verb: &str, args: &[&str]) -> Result<Command, String> {
    let command = match (verb, args) {
        ("subscribe", [analyst, calls]) => Command::Subscribe {
            analyst: analyst.to_string(),
            calls: parse_number(calls, "calls")?,
        },
        ("unsubscribe", [analyst]) => Command::Unsubscribe {
            analyst: analyst.to_string(),
        },
        ("subscription-to", [analyst]) => Command::SubscriptionTo {
            analyst: analyst.to_string(),
        },
        ("count", []) => Command::Count,
        ("subscribers", []) => Command::Subscribers,
        ("subscriber-at", [index]) => Command::SubscriberAt {
            index: parse_number(index, "index")?,
        },
        ("subscription-at", [index]) => Command::SubscriptionAt {
            index: parse_number(index, "index")?,
        },
        ("subscription-of", [subscriber]) => Command::SubscriptionOf {
            subscriber: subscriber.to_string(),
        },
        ("record-of", [subscriber]) => Command::RecordOf {
            subscriber: subscriber.to_string(),
        },
        _ => return Err(format!("unknown or malformed command '{}'", verb)),
    };
    Ok(command)
}

fn parse_number(value: &str, name: &str) -> Result<i64, String> {
    value
        .parse()
        .map_err(|_| format!("{} must be an integer, got '{}'", name, value))
}

pub struct Console {
    service: RegistryService,
}

impl Console {
    pub fn new(service: RegistryService) -> Self {
        Self { service }
    }

    pub fn execute_line(&self, line: &str) -> Outcome {
        match parse_line(line) {
            Ok(Line::Empty) => Outcome::Skip,
            Ok(Line::Quit) => Outcome::Quit,
            Ok(Line::Help) => Outcome::Reply(json!({ "help": HELP })),
            Ok(Line::Audit) => Outcome::Reply(ok(self.service.audit_log())),
            Ok(Line::Run { principal, command }) => {
                let ctx = ExecutionContext::create(principal);
                Outcome::Reply(self.run(&ctx, command))
            }
            Err(message) => Outcome::Reply(json!({
                "error": { "code": "PARSE_ERROR", "message": message }
            })),
        }
    }

    fn run(&self, ctx: &ExecutionContext, command: Command) -> Value {
        let registry = self.service.registry();

        match command {
            Command::Subscribe { analyst, calls } => {
                reply(self.service.subscribe(ctx, analyst, calls).into_result())
            }
            Command::Unsubscribe { analyst } => {
                reply(self.service.unsubscribe(ctx, analyst).into_result())
            }
            Command::SubscriptionTo { analyst } => reply(
                registry
                    .get_subscription_from_address(ctx, &Address::new(analyst))
                    .map_err(UseCaseError::from),
            ),
            Command::Count => ok(registry.count_subscriptions(ctx)),
            Command::Subscribers => ok(registry.list_subscribers(ctx)),
            Command::SubscriberAt { index } => reply(
                registry
                    .get_subscriber_by_index(ctx, index)
                    .map_err(UseCaseError::from),
            ),
            Command::SubscriptionAt { index } => reply(
                registry
                    .get_subscription_by_index(ctx, index)
                    .map_err(UseCaseError::from),
            ),
            Command::SubscriptionOf { subscriber } => reply(
                registry
                    .get_subscription_by_address(ctx, &Address::new(subscriber))
                    .map_err(UseCaseError::from),
            ),
            Command::RecordOf { subscriber } => reply(
                registry
                    .get_subscription_record(ctx, &Address::new(subscriber))
                    .map_err(UseCaseError::from),
            ),
        }
    }
}

fn ok<T: Serialize>(value: T) -> Value {
    match serde_json::to_value(value) {
        Ok(value) => json!({ "ok": value }),
        Err(e) => json!({ "error": { "code": "SERIALIZATION_ERROR", "message": e.to_string() } }),
    }
}

fn reply<T: Serialize>(result: Result<T, UseCaseError>) -> Value {
    match result {
        Ok(value) => ok(value),
        Err(e) => json!({
            "error": {
                "code": e.code(),
                "message": e.message(),
                "status": e.http_status_code(),
            }
        }),
    }
}
