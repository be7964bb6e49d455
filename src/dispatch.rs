//! Executable model of the generated dispatcher.
//!
//! Runs the same [`Stmt`] sequence that `codegen` renders into the override
//! bodies, against trackers implemented in Rust. Arguments are the values an
//! override receives, i.e. after the caller's defaults have been applied.
use thiserror::Error;

use crate::ir::{Binding, Stmt};

pub trait EventTracker {
    fn supports_event_tracking(&self, platforms: &[String]) -> bool;
    fn track_event(&self, event: &TrackingEvent);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackingEvent {
    pub name: String,
    pub parameters: Vec<TrackingParameter>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackingParameter {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error("`{method}` takes {expected} arguments, got {got}")]
    Arity { method: String, expected: usize, got: usize },
    #[error("`{method}`: parameter `{param}` is not nullable")]
    NullArgument { method: String, param: String },
    #[error("`{method}`: body refers to unknown parameter `{param}`")]
    UnknownParameter { method: String, param: String },
    #[error("`{method}`: body dispatches before building an event")]
    NoEvent { method: String },
}

/// Holds a fixed set of trackers; no lifecycle management.
pub struct Dispatcher {
    trackers: Vec<Box<dyn EventTracker>>,
}

impl Dispatcher {
    pub fn new(trackers: Vec<Box<dyn EventTracker>>) -> Self {
        Self { trackers }
    }

    pub fn trackers(&self) -> &[Box<dyn EventTracker>] {
        &self.trackers
    }

    /// Returns how many trackers received the event.
    pub fn invoke(&self, binding: &Binding, args: &[Option<&str>]) -> Result<usize, DispatchError> {
        if args.len() != binding.params.len() {
            return Err(DispatchError::Arity {
                method: binding.method.clone(),
                expected: binding.params.len(),
                got: args.len(),
            });
        }
        for (param, arg) in binding.params.iter().zip(args) {
            if arg.is_none() && !param.nullable {
                return Err(DispatchError::NullArgument {
                    method: binding.method.clone(),
                    param: param.name.clone(),
                });
            }
        }

        let mut params = Vec::<TrackingParameter>::new();
        let mut platforms: &[String] = &[];
        let mut event: Option<TrackingEvent> = None;
        let mut delivered = 0;
        for stmt in &binding.body {
            match stmt {
                Stmt::Collect { param } | Stmt::CollectIfPresent { param } => {
                    if let Some(value) = argument(binding, args, param)? {
                        params.push(TrackingParameter { name: param.clone(), value: value.to_string() });
                    }
                }
                Stmt::Platforms(list) => platforms = list,
                Stmt::BuildEvent { event_name } => {
                    event = Some(TrackingEvent { name: event_name.clone(), parameters: params.clone() });
                }
                Stmt::Dispatch => {
                    let event = match &event {
                        Some(x) => x,
                        None => return Err(DispatchError::NoEvent { method: binding.method.clone() }),
                    };
                    for tracker in &self.trackers {
                        if tracker.supports_event_tracking(platforms) {
                            tracker.track_event(event);
                            delivered += 1;
                        }
                    }
                }
            }
        }
        Ok(delivered)
    }
}

fn argument<'a>(binding: &Binding, args: &[Option<&'a str>], name: &str) -> Result<Option<&'a str>, DispatchError> {
    binding
        .params
        .iter()
        .position(|p| p.name == name)
        .map(|i| args[i])
        .ok_or_else(|| DispatchError::UnknownParameter {
            method: binding.method.clone(),
            param: name.to_string(),
        })
}
