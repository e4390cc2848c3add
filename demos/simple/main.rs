use segment_analytics_consumer::{
    AnalyticsConsumer, AnalyticsConsumerWithWriteOnlyUserId, AnalyticsEvent, ConsumerConfig,
    HttpSegmentClient, InMemorySettingsStore, InstallType, ParameterValue, Parameters,
    UserProperty,
};

pub fn main() {
    env_logger::init();

    // Reads SEGMENT_WRITE_KEY and the optional SEGMENT_ENABLED_INSTALL_TYPES / SEGMENT_REDACTED.
    let config = ConsumerConfig::from_env().unwrap();
    let consumer = config.to_consumer(HttpSegmentClient::new());

    let store = InMemorySettingsStore::new();
    if let Err(err) = consumer.start(InstallType::Development, &store, &()) {
        println!("Segment consumer not started: {}", err);
        return;
    }

    consumer.set_user_id(Some("test-user"));

    let property = consumer.trim_user_property(&UserProperty::new("subscription_plan"));
    consumer.set_user_property(&property, Some("pro"));

    let event = consumer.trim_event(&AnalyticsEvent::new("app_open"));
    let params: Parameters = [("source".to_owned(), ParameterValue::from("push"))].into();
    consumer.track(&event, Some(&params));

    // Block until queued messages are delivered.
    consumer.client().shutdown().unwrap();
}
