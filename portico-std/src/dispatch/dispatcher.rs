//! The decode → intercept → drive pipeline.

use super::{DispatchDeliverer, OutputRouter};
use crate::registration::Registration;
use portico_core::{
    Attributes, BoxError, Context, DispatchError, DriveRequest, Frame, InterceptRequest,
    InterceptResult, Packet,
};
use std::sync::Arc;
use tracing::{debug, warn};

/// A reply packet returned by a driver.
#[derive(Debug, Clone)]
pub struct DriverReply {
    /// The driver's registered name.
    pub driver: String,
    /// The reply.
    pub packet: Packet,
}

/// A driver that failed during a dispatch.
#[derive(Debug)]
pub struct DriverFailure {
    /// The driver's registered name.
    pub driver: String,
    /// The driver's error.
    pub error: BoxError,
}

/// What happened to the drivers of one dispatch.
#[derive(Debug, Default)]
pub struct DispatchReport {
    /// Number of drivers whose filter matched and that were invoked.
    pub driven: usize,
    /// Replies in driver order.
    pub replies: Vec<DriverReply>,
    /// Failures in driver order. A failure never prevents later drivers from
    /// running.
    pub failures: Vec<DriverFailure>,
}

/// The result of a dispatch that did not error.
#[derive(Debug)]
pub enum DispatchOutcome {
    /// Every matching interceptor continued and every matching driver ran.
    Completed(DispatchReport),
    /// An interceptor stopped the dispatch; no driver ran.
    ShortCircuited {
        /// The interceptor's registered name.
        interceptor: String,
    },
}

impl DispatchOutcome {
    /// The driver report, unless the dispatch was short-circuited.
    pub fn report(&self) -> Option<&DispatchReport> {
        match self {
            DispatchOutcome::Completed(report) => Some(report),
            DispatchOutcome::ShortCircuited { .. } => None,
        }
    }

    /// Whether an interceptor stopped the dispatch.
    pub fn is_short_circuited(&self) -> bool {
        matches!(self, DispatchOutcome::ShortCircuited { .. })
    }
}

/// Runs dispatches over a frozen registration.
///
/// # Example
///
/// ```rust,ignore
/// let dispatcher = Arc::new(Dispatcher::new(registration.clone()));
/// let outcome = dispatcher.dispatch_frame("card.read", "reader-1", frame).await?;
/// ```
pub struct Dispatcher {
    registration: Arc<Registration>,
    ctx: Context,
}

impl Dispatcher {
    /// A dispatcher with an empty context.
    pub fn new(registration: Arc<Registration>) -> Self {
        Self::with_context(registration, Context::new())
    }

    /// A dispatcher passing `ctx` to every component.
    pub fn with_context(registration: Arc<Registration>, ctx: Context) -> Self {
        Self { registration, ctx }
    }

    /// The registration dispatched over.
    pub fn registration(&self) -> &Arc<Registration> {
        &self.registration
    }

    /// The context handed to components.
    pub fn context(&self) -> &Context {
        &self.ctx
    }

    /// The [`InputDeliverer`](portico_core::InputDeliverer) to hand to the
    /// input device registered under `uuid`.
    pub fn deliverer_for(self: &Arc<Self>, uuid: impl Into<String>) -> DispatchDeliverer {
        DispatchDeliverer::new(self.clone(), uuid)
    }

    /// Decode `frame` with the source device's decoder, then dispatch it.
    pub async fn dispatch_frame(
        &self,
        topic: &str,
        uuid: &str,
        frame: Frame,
    ) -> Result<DispatchOutcome, DispatchError> {
        if topic.is_empty() {
            return Err(DispatchError::EmptyTopic);
        }
        let device = self
            .registration
            .input_device(uuid)
            .ok_or_else(|| DispatchError::UnknownDevice(uuid.to_string()))?;
        let decoder = device.base().decoder().ok_or_else(|| DispatchError::Decode {
            uuid: uuid.to_string(),
            source: "no decoder bound".into(),
        })?;
        let packet = decoder.decode(frame).map_err(|source| DispatchError::Decode {
            uuid: uuid.to_string(),
            source,
        })?;
        self.dispatch(topic, uuid, packet).await
    }

    /// Run the interceptor chain, then every matching driver.
    pub async fn dispatch(
        &self,
        topic: &str,
        uuid: &str,
        packet: Packet,
    ) -> Result<DispatchOutcome, DispatchError> {
        if topic.is_empty() {
            return Err(DispatchError::EmptyTopic);
        }

        let mut attrs = Attributes::new();
        for entry in self.registration.interceptors() {
            if !entry.accepts(topic) {
                continue;
            }
            let request = InterceptRequest {
                attrs: &mut attrs,
                topic,
                uuid,
                packet: &packet,
                ctx: &self.ctx,
            };
            match entry.interceptor().intercept_dyn(request).await {
                Ok(InterceptResult::Next) => {}
                Ok(InterceptResult::Stop) => {
                    debug!(topic, uuid, interceptor = entry.name(), "dispatch short-circuited");
                    return Ok(DispatchOutcome::ShortCircuited {
                        interceptor: entry.name().to_string(),
                    });
                }
                Err(source) => {
                    return Err(DispatchError::Interceptor {
                        name: entry.name().to_string(),
                        source,
                    });
                }
            }
        }

        let router = OutputRouter::new(&self.registration, &self.ctx);
        let mut report = DispatchReport::default();
        for entry in self.registration.drivers() {
            if !entry.accepts(topic) {
                continue;
            }
            report.driven += 1;
            let request = DriveRequest {
                attrs: &attrs,
                topic,
                uuid,
                packet: &packet,
                deliverer: &router,
                ctx: &self.ctx,
            };
            match entry.driver().drive_dyn(request).await {
                Ok(Some(packet)) => report.replies.push(DriverReply {
                    driver: entry.name().to_string(),
                    packet,
                }),
                Ok(None) => {}
                Err(error) => {
                    warn!(topic, uuid, driver = entry.name(), %error, "driver failed");
                    report.failures.push(DriverFailure {
                        driver: entry.name().to_string(),
                        error,
                    });
                }
            }
        }

        debug!(
            topic,
            uuid,
            driven = report.driven,
            failures = report.failures.len(),
            "dispatch completed"
        );
        Ok(DispatchOutcome::Completed(report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        registration::{DriverEntry, InterceptorEntry, RegistrationBuilder},
        testing::{FlagInterceptor, Journal, RecordingDriver},
    };
    use portico_core::{TopicFilter, TopicSyntax};

    fn filter(patterns: &[&str]) -> TopicFilter {
        TopicFilter::compile(patterns, &TopicSyntax::default()).unwrap()
    }

    fn packet() -> Packet {
        Packet::new().with_field("payload", "hello")
    }

    #[tokio::test]
    async fn test_empty_topic_is_rejected() {
        let dispatcher = Dispatcher::new(Arc::new(RegistrationBuilder::new().build()));
        assert!(matches!(
            dispatcher.dispatch("", "dev-1", packet()).await,
            Err(DispatchError::EmptyTopic)
        ));
        assert!(matches!(
            dispatcher.dispatch_frame("", "dev-1", Frame::empty()).await,
            Err(DispatchError::EmptyTopic)
        ));
    }

    #[tokio::test]
    async fn test_unknown_source_device() {
        let dispatcher = Dispatcher::new(Arc::new(RegistrationBuilder::new().build()));
        assert!(matches!(
            dispatcher.dispatch_frame("a/b", "ghost", Frame::empty()).await,
            Err(DispatchError::UnknownDevice(uuid)) if uuid == "ghost"
        ));
    }

    #[tokio::test]
    async fn test_interceptors_run_by_ascending_priority() {
        let journal = Journal::new();
        let mut builder = RegistrationBuilder::new();
        for (name, priority) in [("late", 10), ("early", -5), ("middle-a", 0), ("middle-b", 0)] {
            builder.add_interceptor(
                InterceptorEntry::new(name, FlagInterceptor::new(name).with_journal(&journal))
                    .with_priority(priority),
            );
        }
        builder.add_driver(DriverEntry::new(
            "driver",
            RecordingDriver::new().with_journal(&journal, "driver"),
        ));

        let dispatcher = Dispatcher::new(Arc::new(builder.build()));
        dispatcher.dispatch("a/b", "dev-1", packet()).await.unwrap();

        assert_eq!(
            journal.entries(),
            vec!["early", "middle-a", "middle-b", "late", "driver"]
        );
    }

    #[tokio::test]
    async fn test_stop_short_circuits_drivers() {
        let driver = RecordingDriver::new();
        let mut builder = RegistrationBuilder::new();
        builder.add_interceptor(InterceptorEntry::new(
            "gate",
            FlagInterceptor::new("blocked").with_result(InterceptResult::Stop),
        ));
        builder.add_driver(DriverEntry::new("driver", driver.clone()));

        let dispatcher = Dispatcher::new(Arc::new(builder.build()));
        let outcome = dispatcher.dispatch("a/b", "dev-1", packet()).await.unwrap();

        assert!(matches!(
            outcome,
            DispatchOutcome::ShortCircuited { ref interceptor } if interceptor == "gate"
        ));
        assert_eq!(driver.count(), 0);
    }

    #[tokio::test]
    async fn test_interceptor_error_is_not_a_short_circuit() {
        let driver = RecordingDriver::new();
        let mut builder = RegistrationBuilder::new();
        builder.add_interceptor(InterceptorEntry::new(
            "broken",
            FlagInterceptor::new("x").failing("denied"),
        ));
        builder.add_driver(DriverEntry::new("driver", driver.clone()));

        let dispatcher = Dispatcher::new(Arc::new(builder.build()));
        let err = dispatcher.dispatch("a/b", "dev-1", packet()).await.unwrap_err();

        assert!(matches!(err, DispatchError::Interceptor { ref name, .. } if name == "broken"));
        assert_eq!(driver.count(), 0);
    }

    #[tokio::test]
    async fn test_driver_failure_does_not_stop_others() {
        let first = RecordingDriver::new().failing("boom");
        let second = RecordingDriver::new().replying(Packet::new().with_field("ok", true));
        let mut builder = RegistrationBuilder::new();
        builder.add_driver(DriverEntry::new("first", first.clone()));
        builder.add_driver(DriverEntry::new("second", second.clone()));

        let dispatcher = Dispatcher::new(Arc::new(builder.build()));
        let outcome = dispatcher.dispatch("a/b", "dev-1", packet()).await.unwrap();
        let report = outcome.report().unwrap();

        assert_eq!(report.driven, 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].driver, "first");
        assert_eq!(report.replies.len(), 1);
        assert_eq!(report.replies[0].driver, "second");
        assert_eq!(second.count(), 1);
    }

    #[tokio::test]
    async fn test_topic_filters_select_components() {
        let door = RecordingDriver::new();
        let alarm = RecordingDriver::new();
        let mut builder = RegistrationBuilder::new();
        builder.add_driver(
            DriverEntry::new("door", door.clone()).with_filter(filter(&["door/+/open"])),
        );
        builder.add_driver(
            DriverEntry::new("alarm", alarm.clone()).with_filter(filter(&["alarm/#"])),
        );
        builder.add_interceptor(
            InterceptorEntry::new("alarm-only", FlagInterceptor::new("alarmed"))
                .with_filter(filter(&["alarm/#"])),
        );

        let dispatcher = Dispatcher::new(Arc::new(builder.build()));
        dispatcher.dispatch("door/3/open", "dev-1", packet()).await.unwrap();

        assert_eq!(door.count(), 1);
        assert_eq!(alarm.count(), 0);
        assert!(!door.records()[0].attrs.contains("alarmed"));
    }
}
