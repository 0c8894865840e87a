use cadence::{CountedExt, Gauged, NopMetricSink, StatsdClient, UdpMetricSink};
use sentry::ClientInitGuard;
use sentry_tracing::EventFilter;
use std::borrow::Cow;
use std::net::UdpSocket;
use strum_macros::{Display as EnumToString, EnumIter};
use tracing::subscriber::set_global_default;
use tracing_actix_web_mozlog::{JsonStorageLayer, MozLogFormatLayer};
use tracing_log::LogTracer;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{layer::SubscriberExt, EnvFilter, Registry};

use crate::settings::Settings;

#[derive(Debug, EnumToString, EnumIter, PartialEq, Eq)]
#[strum(serialize_all = "kebab_case")]
pub enum LogKey {
    // Registry
    ListenersCreate,
    ListenersCreateEmpty,
    ListenersCreateFailed,
    ListenersCreatePartial,
    ListenersDelete,
    ListenersDeleteFailed,
    ListenersList,
    ListenersListFailed,
    // Pipedrive
    PipedriveRequestFailed,
    PipedrivePersonCreated,
    // Infra
    ServerInit,
    StatsDError,
    Test, // For test cases
}

/// Log an info event tagged with a `LogKey`.
#[macro_export]
macro_rules! info {
    ($key:expr, $($arg:tt)+) => {
        ::tracing::info!(r#type = $key.to_string().as_str(), $($arg)+)
    };
}

/// Log an error event tagged with a `LogKey`. An `error = e` field is
/// rendered with the error's `Display`.
#[macro_export]
macro_rules! error {
    ($key:expr, error = $e:expr, $($arg:tt)+) => {
        ::tracing::error!(r#type = $key.to_string().as_str(), error = %$e, $($arg)+)
    };
    ($key:expr, $($arg:tt)+) => {
        ::tracing::error!(r#type = $key.to_string().as_str(), $($arg)+)
    };
}

#[macro_export]
macro_rules! info_and_incr {
    ($statsd:expr, $key:expr, $($arg:tt)+) => {{
        $statsd.incr(&$key);
        $crate::info!($key, $($arg)+);
    }};
}

#[macro_export]
macro_rules! error_and_incr {
    ($statsd:expr, $key:expr, $($arg:tt)+) => {{
        $statsd.incr(&$key);
        $crate::error!($key, $($arg)+);
    }};
}

/// Creates a tracing subscriber and sets it as the global default.
pub fn init_tracing<Sink>(service_name: &str, log_level: &str, sink: Sink)
where
    Sink: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    // Filter out any events that are below `log_level`.
    let env_filter = EnvFilter::new(log_level);

    // Only ERROR events go to Sentry. This is separate from the EnvFilter,
    // which is responsible for the log output itself.
    let sentry_layer = sentry_tracing::layer().event_filter(|md| match md.level() {
        &tracing::Level::ERROR => EventFilter::Event,
        _ => EventFilter::Ignore,
    });

    let subscriber = Registry::default()
        .with(env_filter)
        .with(JsonStorageLayer)
        .with(MozLogFormatLayer::new(service_name, sink))
        .with(sentry_layer);

    LogTracer::init().expect("Failed to set logger");
    set_global_default(subscriber).expect("Failed to set subscriber");
}

pub fn init_sentry(settings: &Settings) -> ClientInitGuard {
    sentry::init((
        settings.sentry_dsn.clone(),
        sentry::ClientOptions {
            environment: Some(Cow::from(settings.environment.clone())),
            // Suppress breadcrumbs.
            max_breadcrumbs: 0,
            release: Some(Cow::from(env!("CARGO_PKG_VERSION"))),
            // `sample_rate` defines the sample rate of error events (i.e. panics and error
            // log messages). Should always be 1.0.
            sample_rate: 1.0,
            // No performance tracing.
            traces_sample_rate: 0.0,
            ..Default::default()
        },
    ))
}

pub struct StatsD {
    client: StatsdClient,
}

impl StatsD {
    pub fn new(settings: &Settings) -> Self {
        let host = (settings.statsd_host.clone(), settings.statsd_port);
        // Intentional expect. Metrics wiring happens once at startup.
        let socket = UdpSocket::bind("0.0.0.0:0").expect("Could not bind statsd socket");
        let sink = UdpMetricSink::from(host, socket).expect("Could not create statsd sink");

        StatsD {
            client: StatsdClient::from_sink("event-routing", sink),
        }
    }

    /// A client that drops every metric.
    pub fn nop() -> Self {
        StatsD {
            client: StatsdClient::from_sink("event-routing", NopMetricSink),
        }
    }

    pub fn incr(&self, key: &LogKey) {
        let tag = key.to_string();
        self.client
            .incr(&tag)
            .map_err(|e| {
                error!(
                    LogKey::StatsDError,
                    error = e,
                    "Could not increment statsd tag {}",
                    tag
                );
            })
            .ok();
    }

    pub fn gauge(&self, key: &LogKey, value: usize) {
        let tag = key.to_string();
        self.client
            .gauge(&tag, value as u64)
            .map_err(|e| {
                error!(
                    LogKey::StatsDError,
                    error = e,
                    "Could not record gauge {} for statsd tag {}",
                    value,
                    tag
                );
            })
            .ok();
    }
}
