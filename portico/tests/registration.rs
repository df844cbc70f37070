mod common;

use common::{ScriptedInput, register_text_codecs};
use portico::{
    AssemblyError, BoxError, Bundle, CodecProvider, Component, Config, Context, Decoder,
    DeviceRole, Dispatcher, Encoder, Initialize, LifecyclePhase, Packet, Plugin,
    RegistrationBuilder, VirtualDevice,
    config::from_toml_str,
    init_with_args,
    network::{NetworkInputDevice, Transport},
    testing::{
        FlagInterceptor, Journal, PayloadDecoder, PayloadEncoder, RecordingDriver,
        RecordingOutputDevice,
    },
};
use std::sync::Arc;

fn builder() -> RegistrationBuilder {
    let mut builder = RegistrationBuilder::new();
    register_text_codecs(&mut builder);
    builder.add_bundle_factory("scripted", || Bundle::input_device(ScriptedInput::new()));
    builder.add_bundle_factory("lock", || Bundle::output_device(RecordingOutputDevice::new()));
    builder.add_bundle_factory("udp-reader", || Bundle::input_device(NetworkInputDevice::udp()));
    builder
}

// ============================================================================
// Device Identity
// ============================================================================

#[test]
fn test_missing_uuid_is_fatal_and_adds_nothing() {
    let document = from_toml_str(
        r#"
        [inputs.front-reader]
        type = "scripted"
        name = "front"
        group = "lobby"
        private = "r1"
        topic = "card.read"
        "#,
    )
    .unwrap();

    let mut builder = builder();
    let err = builder.assemble(&document, init_with_args).unwrap_err();

    assert!(matches!(err, AssemblyError::InvalidAddress { ref entry } if entry == "front-reader"));
    assert_eq!(builder.input_count(), 0);
    assert_eq!(builder.output_count(), 0);
}

#[test]
fn test_uuid_is_unique_across_roles() {
    let document = from_toml_str(
        r#"
        [outputs.front-lock]
        type = "lock"
        name = "front lock"
        uuid = "dev-1"
        group = "lobby"
        private = "l1"

        [inputs.front-reader]
        type = "scripted"
        name = "front reader"
        uuid = "dev-1"
        group = "lobby"
        private = "r1"
        topic = "card.read"
        "#,
    )
    .unwrap();

    let mut builder = builder();
    let err = builder.assemble(&document, init_with_args).unwrap_err();

    assert!(matches!(
        err,
        AssemblyError::DuplicateUuid { ref uuid, existing: DeviceRole::Output } if uuid == "dev-1"
    ));
    assert_eq!(builder.output_count(), 1);
    assert_eq!(builder.input_count(), 0);
}

#[test]
fn test_input_device_requires_topic() {
    let document = from_toml_str(
        r#"
        [inputs.front-reader]
        type = "scripted"
        name = "front reader"
        uuid = "dev-1"
        group = "lobby"
        private = "r1"
        "#,
    )
    .unwrap();

    let err = builder().assemble(&document, init_with_args).unwrap_err();
    assert!(matches!(err, AssemblyError::MissingField { field: "topic", .. }));
}

#[test]
fn test_named_codecs_must_exist() {
    let document = from_toml_str(
        r#"
        [outputs.front-lock]
        type = "lock"
        name = "front lock"
        uuid = "lock-1"
        group = "lobby"
        private = "l1"
        encoder = "protobuf"
        "#,
    )
    .unwrap();

    let err = builder().assemble(&document, init_with_args).unwrap_err();
    assert!(matches!(
        err,
        AssemblyError::UnknownEncoder { ref name, .. } if name == "protobuf"
    ));
}

#[test]
fn test_output_pattern_from_configuration() {
    let document = from_toml_str(
        r#"
        [outputs.front-lock]
        type = "lock"
        name = "front lock"
        uuid = "lock-1"
        group = "lobby"
        private = "l1"
        encoder = "text-out"
        decoder = "text-in"
        topic = "lock/#"

        [outputs.side-lock]
        type = "lock"
        name = "side lock"
        uuid = "lock-2"
        group = "lobby"
        private = "l2"
        "#,
    )
    .unwrap();

    let mut builder = builder();
    builder.assemble(&document, init_with_args).unwrap();
    let registration = builder.build();

    let matching: Vec<_> = registration
        .outputs_matching("lock/front")
        .map(|device| device.base().address().uuid.clone())
        .collect();
    assert_eq!(matching, vec!["lock-1"]);
    assert!(registration.output_device("lock-2").is_some());
}

// ============================================================================
// Factories and Codecs
// ============================================================================

#[test]
fn test_later_factory_replaces_earlier() {
    let mut builder = RegistrationBuilder::new();
    builder.add_bundle_factory("door", || Bundle::driver(RecordingDriver::new()));
    builder.add_bundle_factory("door", || Bundle::interceptor(FlagInterceptor::new("door")));

    let registration = builder.build();
    assert!(matches!(registration.create("door"), Some(Bundle::Interceptor(_))));
    assert!(registration.create("window").is_none());
}

struct BothCodecs;

impl CodecProvider for BothCodecs {
    fn encoder(&self) -> Option<Arc<dyn Encoder>> {
        Some(Arc::new(PayloadEncoder))
    }

    fn decoder(&self) -> Option<Arc<dyn Decoder>> {
        Some(Arc::new(PayloadDecoder))
    }
}

struct NoCodec;

impl CodecProvider for NoCodec {}

#[test]
fn test_codec_factories_are_classified() {
    let mut builder = RegistrationBuilder::new();
    register_text_codecs(&mut builder);

    assert!(matches!(
        builder.add_codec_factory("both", || BothCodecs),
        Err(AssemblyError::AmbiguousCodec(name)) if name == "both"
    ));
    assert!(matches!(
        builder.add_codec_factory("none", || NoCodec),
        Err(AssemblyError::UnknownCodec(name)) if name == "none"
    ));
    assert!(matches!(
        builder.add_encoder("text-out", Arc::new(PayloadEncoder)),
        Err(AssemblyError::DuplicateEncoder(name)) if name == "text-out"
    ));

    let registration = builder.build();
    assert!(registration.encoder("text-out").is_some());
    assert!(registration.decoder("text-in").is_some());
    assert!(registration.encoder("text-in").is_none());
}

// ============================================================================
// Entry Handling
// ============================================================================

#[test]
fn test_disabled_entries_are_skipped() {
    let driver = RecordingDriver::new();
    let mut builder = RegistrationBuilder::new();
    let shared = driver.clone();
    builder.add_bundle_factory("door", move || Bundle::driver(shared.clone()));

    let document = from_toml_str(
        r#"
        [drivers.door]
        topics = ["door/#"]

        [drivers.window]
        disable = true
        "#,
    )
    .unwrap();
    builder.assemble(&document, init_with_args).unwrap();

    let registration = builder.build();
    assert_eq!(registration.drivers().len(), 1);
    assert_eq!(registration.drivers()[0].name(), "door");
}

#[test]
fn test_unknown_type_is_fatal() {
    let document = from_toml_str(
        r##"
        [drivers.door]
        type = "missing"
        topics = ["#"]
        "##,
    )
    .unwrap();

    let err = RegistrationBuilder::new()
        .assemble(&document, init_with_args)
        .unwrap_err();
    assert!(matches!(
        err,
        AssemblyError::MissingFactory { ref type_name, .. } if type_name == "missing"
    ));
}

#[test]
fn test_filtered_components_need_topics() {
    let mut builder = RegistrationBuilder::new();
    builder.add_bundle_factory("door", || Bundle::driver(RecordingDriver::new()));

    let document = from_toml_str("[drivers.door]\ntopics = []\n").unwrap();
    assert!(matches!(
        builder.assemble(&document, init_with_args),
        Err(AssemblyError::InvalidTopics { .. })
    ));

    let document = from_toml_str("[drivers.door]\ntopics = [\"door/#/open\"]\n").unwrap();
    assert!(matches!(
        builder.assemble(&document, init_with_args),
        Err(AssemblyError::InvalidPattern { .. })
    ));
}

#[tokio::test]
async fn test_unfiltered_driver_needs_no_topics() {
    let driver = RecordingDriver::new().unfiltered();
    let mut builder = RegistrationBuilder::new();
    let shared = driver.clone();
    builder.add_bundle_factory("audit", move || Bundle::driver(shared.clone()));

    let document = from_toml_str("[drivers.audit]\nname = \"audit log\"\n").unwrap();
    builder.assemble(&document, init_with_args).unwrap();

    let registration = Arc::new(builder.build());
    assert_eq!(registration.drivers()[0].name(), "audit log");
    let dispatcher = Dispatcher::new(registration);
    for topic in ["card.read", "door/1/open"] {
        dispatcher
            .dispatch(topic, "reader-1", Packet::new())
            .await
            .unwrap();
    }

    let topics: Vec<_> = driver.records().into_iter().map(|r| r.topic).collect();
    assert_eq!(topics, vec!["card.read", "door/1/open"]);
}

#[test]
fn test_interceptor_priority_from_configuration() {
    let journal = Journal::new();
    let mut builder = RegistrationBuilder::new();
    let shared = journal.clone();
    builder.add_bundle_factory("flag", move || {
        Bundle::interceptor(FlagInterceptor::new("seen").with_journal(&shared))
    });

    let document = from_toml_str(
        r##"
        [interceptors.audit]
        type = "flag"
        priority = 10
        topics = ["#"]

        [interceptors.auth]
        type = "flag"
        priority = -1
        topics = ["#"]

        [interceptors.rate]
        type = "flag"
        topics = ["#"]
        "##,
    )
    .unwrap();
    builder.assemble(&document, init_with_args).unwrap();

    let registration = builder.build();
    let order: Vec<_> = registration
        .interceptors()
        .iter()
        .map(|entry| (entry.name(), entry.priority()))
        .collect();
    assert_eq!(order, vec![("auth", -1), ("rate", 0), ("audit", 10)]);
}

// ============================================================================
// Initialization
// ============================================================================

const NETWORK_READER: &str = r#"
[inputs.front-reader]
type = "udp-reader"
name = "front reader"
uuid = "reader-1"
group = "lobby"
private = "r1"
decoder = "text-in"
topic = "card.read"

[inputs.front-reader.InitArgs]
networkAddress = "127.0.0.1:0"
readTimeout = "200ms"
"#;

#[test]
fn test_init_args_reach_network_device() {
    let document = from_toml_str(NETWORK_READER).unwrap();
    let mut builder = builder();
    builder.assemble(&document, init_with_args).unwrap();
    let registration = builder.build();

    let device = registration.input_device("reader-1").unwrap();
    assert_eq!(device.base().name(), "front reader");
    assert_eq!(device.base().topic(), "card.read");
    device.on_start(&Context::new()).unwrap();
    device.on_stop(&Context::new()).unwrap();

    let mut direct = NetworkInputDevice::udp();
    assert_eq!(direct.transport(), Some(Transport::Udp));
    direct.base_mut().set_topic("card.read");
    assert_eq!(direct.topic(), "card.read");
}

#[test]
fn test_init_failure_is_fatal() {
    let document = from_toml_str(&NETWORK_READER.replace("200ms", "0")).unwrap();
    let mut builder = builder();
    let err = builder.assemble(&document, init_with_args).unwrap_err();

    assert!(matches!(err, AssemblyError::Init { ref entry, .. } if entry == "front-reader"));
    assert_eq!(builder.input_count(), 0);
}

#[test]
fn test_custom_init_hook() {
    let document = from_toml_str(NETWORK_READER).unwrap();
    let mut seen = Vec::new();
    let mut builder = builder();
    builder
        .assemble(&document, |target, args| {
            seen.push(args.get_str("networkAddress").unwrap_or_default().to_string());
            init_with_args(target, args)
        })
        .unwrap();

    assert_eq!(seen, vec!["127.0.0.1:0"]);
    assert_eq!(builder.input_count(), 1);
}

// ============================================================================
// Plugins
// ============================================================================

/// Journals its `InitArgs` label and every lifecycle call.
struct JournalPlugin {
    journal: Journal,
}

impl Component for JournalPlugin {
    fn as_initialize(&mut self) -> Option<&mut dyn Initialize> {
        Some(self)
    }
}

impl Initialize for JournalPlugin {
    fn on_init(&mut self, args: &Config) -> Result<(), BoxError> {
        let label = args.get_str("label").ok_or("label is required")?;
        self.journal.push(format!("init {label}"));
        Ok(())
    }
}

impl Plugin for JournalPlugin {
    fn on_start(&self, _ctx: &Context) -> Result<(), BoxError> {
        self.journal.push("start");
        Ok(())
    }

    fn on_stop(&self, _ctx: &Context) -> Result<(), BoxError> {
        self.journal.push("stop");
        Ok(())
    }
}

#[test]
fn test_plugin_from_configuration() {
    let journal = Journal::new();
    let mut builder = builder();
    let shared = journal.clone();
    builder.add_bundle_factory("metrics", move || {
        Bundle::plugin(JournalPlugin {
            journal: shared.clone(),
        })
    });

    let document = from_toml_str(&format!(
        r#"
        [plugins.stats]
        type = "metrics"
        name = "gateway stats"

        [plugins.stats.InitArgs]
        label = "lobby"
        {NETWORK_READER}"#
    ))
    .unwrap();
    builder.assemble(&document, init_with_args).unwrap();
    assert_eq!(builder.input_count(), 1);

    let registration = builder.build();
    let plugins = registration.plugins();
    assert_eq!(plugins.len(), 1);
    assert_eq!(plugins[0].name(), "gateway stats");
    assert!(registration.drivers().is_empty());

    let ctx = Context::new();
    plugins[0].plugin().on_start(&ctx).unwrap();
    plugins[0].plugin().on_stop(&ctx).unwrap();
    assert_eq!(journal.entries(), vec!["init lobby", "start", "stop"]);
}

// ============================================================================
// Lifecycle
// ============================================================================

#[test]
fn test_lifecycle_hooks_run_per_phase() {
    let journal = Journal::new();
    let mut builder = RegistrationBuilder::new();
    for (phase, label) in [
        (LifecyclePhase::BeforeStart, "before-start"),
        (LifecyclePhase::AfterStop, "after-stop"),
        (LifecyclePhase::BeforeStart, "before-start-2"),
    ] {
        let journal = journal.clone();
        builder.add_lifecycle_hook(phase, move |_ctx| {
            journal.push(label);
            Ok(())
        });
    }
    builder.add_lifecycle_hook(LifecyclePhase::BeforeStop, |_ctx| Err("refused".into()));

    let registration = builder.build();
    let ctx = Context::new();
    registration.run_hooks(LifecyclePhase::BeforeStart, &ctx).unwrap();
    registration.run_hooks(LifecyclePhase::AfterStart, &ctx).unwrap();
    assert!(registration.run_hooks(LifecyclePhase::BeforeStop, &ctx).is_err());
    registration.run_hooks(LifecyclePhase::AfterStop, &ctx).unwrap();

    assert_eq!(
        journal.entries(),
        vec!["before-start", "before-start-2", "after-stop"]
    );
}
