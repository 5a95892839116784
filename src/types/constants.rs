/// Envelope discriminators (magic strings layer)
pub mod envelope_types {
    pub const EVENT: &str = "event";
}

/// Listener topic strings
pub mod topics {
    pub const CONNECTED: &str = "connected";
    pub const MESSAGE: &str = "message";
    pub const EVENT: &str = "event";
    pub const ERROR: &str = "error";
}

/// Path of the event stream, relative to the WebSocket base URL
pub const EVENTS_WS_PATH: &str = "/api/events/ws";

/// Path prefix of every REST endpoint
pub const API_PREFIX: &str = "/api";

/// Default backend base URL
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Default WebSocket base URL
pub const DEFAULT_WS_URL: &str = "ws://localhost:8000";

/// Default REST timeout (milliseconds)
pub const DEFAULT_TIMEOUT: u64 = 30_000;

/// Default reconnect base delay (milliseconds)
pub const DEFAULT_RECONNECT_DELAY: u64 = 1_000;

/// Default cap on consecutive reconnect attempts
pub const DEFAULT_MAX_RECONNECT_ATTEMPTS: u32 = 5;

/// Default status polling interval (milliseconds)
pub const DEFAULT_STATUS_POLL_INTERVAL: u64 = 30_000;

/// Storage key of the persisted settings record
pub const SETTINGS_STORAGE_KEY: &str = "aria-settings";

/// Default number of events kept by the event feed
pub const DEFAULT_EVENT_FEED_CAPACITY: usize = 50;

/// Device control responses that are applied locally
pub mod device_status {
    pub const SUCCESS: &str = "success";
    pub const SIMULATED: &str = "simulated";
}

/// Device actions with a known local effect
pub mod device_actions {
    pub const TURN_ON: &str = "turn_on";
    pub const TURN_OFF: &str = "turn_off";
}

/// WebSocket close codes
pub const WS_CLOSE_NORMAL: u16 = 1000;
