use crate::environment::{write_environmental_model, EnvironmentalRecord};
use futures::future::join_all;
use log::{error, info, warn};
use std::path::PathBuf;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::mpsc::{self, Receiver, Sender};
use tokio::task::JoinHandle;

/// Speaks (or otherwise delivers) guidance to the user.
pub trait Announcer: Send + 'static {
    fn announce(&mut self, phrase: &str);
}

/// Writes guidance to the log; stands in for a speech engine.
#[derive(Debug, Default)]
pub struct LogAnnouncer;

impl Announcer for LogAnnouncer {
    fn announce(&mut self, phrase: &str) {
        info!("Guidance: {phrase}");
    }
}

pub struct ServiceHandle {
    pub name: &'static str,
    handle: JoinHandle<()>,
}

/// Background work the frame loop hands off to without waiting on it.
///
/// Each service reads from a bounded channel; when a service falls behind,
/// new messages are dropped instead of stalling the frame loop.
pub struct Services {
    environment: Option<Sender<Vec<EnvironmentalRecord>>>,
    announcements: Option<Sender<String>>,
    handles: Vec<ServiceHandle>,
}

impl Services {
    /// Spawns every service on the current runtime.
    pub fn start(environment_path: PathBuf, announcer: impl Announcer, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (environment, environment_rx) = mpsc::channel(capacity);
        let (announcements, announcements_rx) = mpsc::channel(capacity);

        let handles = vec![
            ServiceHandle {
                name: "environment-writer",
                handle: tokio::spawn(environment_writer(environment_path, environment_rx)),
            },
            ServiceHandle {
                name: "announcer",
                handle: tokio::spawn(announce(announcer, announcements_rx)),
            },
        ];

        Self {
            environment: Some(environment),
            announcements: Some(announcements),
            handles,
        }
    }

    pub fn handles(&self) -> &[ServiceHandle] {
        &self.handles
    }

    pub fn publish_environment(&self, records: Vec<EnvironmentalRecord>) -> bool {
        hand_off("environment-writer", self.environment.as_ref(), records)
    }

    pub fn announce(&self, phrase: String) -> bool {
        hand_off("announcer", self.announcements.as_ref(), phrase)
    }

    /// Closes every channel and waits for the services to drain them.
    pub async fn shutdown(mut self) {
        self.environment.take();
        self.announcements.take();

        let names: Vec<_> = self.handles.iter().map(|service| service.name).collect();
        let results = join_all(self.handles.drain(..).map(|service| service.handle)).await;
        for (name, result) in names.into_iter().zip(results) {
            match result {
                Ok(()) => info!("Service {name} stopped"),
                Err(err) => error!("Service {name} ended abnormally: {err}"),
            }
        }
    }
}

fn hand_off<T>(name: &str, sender: Option<&Sender<T>>, message: T) -> bool {
    let Some(sender) = sender else {
        warn!("Service {name} is already shut down");
        return false;
    };

    match sender.try_send(message) {
        Ok(()) => true,
        Err(TrySendError::Full(_)) => {
            warn!("Service {name} is busy, dropping message");
            false
        }
        Err(TrySendError::Closed(_)) => {
            error!("Service {name} has stopped");
            false
        }
    }
}

async fn environment_writer(path: PathBuf, mut rx: Receiver<Vec<EnvironmentalRecord>>) {
    while let Some(records) = rx.recv().await {
        let path = path.clone();
        let written =
            tokio::task::spawn_blocking(move || write_environmental_model(&path, &records)).await;
        match written {
            Ok(Ok(())) => {}
            Ok(Err(err)) => warn!("Failed to write environmental model: {err:#}"),
            Err(err) => error!("Environmental model writer panicked: {err}"),
        }
    }
}

async fn announce(mut announcer: impl Announcer, mut rx: Receiver<String>) {
    while let Some(phrase) = rx.recv().await {
        announcer.announce(&phrase);
    }
}
