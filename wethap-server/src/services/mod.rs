pub mod clock;
pub mod connection_registry;
pub mod identity_resolver;
pub mod keep_alive;
pub mod reading_service;
pub mod rename_coordinator;
pub mod scheduled_broadcaster;
pub mod sender_session;
pub mod weather_service;

pub use clock::{Clock, SystemClock};
pub use connection_registry::{ConnectionHandle, ConnectionRegistry, Outbound, SessionIdentity, SessionToken};
pub use identity_resolver::{IdentityResolver, Resolution, ResolutionKind};
pub use keep_alive::KeepAlive;
pub use reading_service::{ReadingService, StoredReading};
pub use rename_coordinator::{RenameCoordinator, RenameOutcome, RenameTarget};
pub use scheduled_broadcaster::{CycleOutcome, DailySchedule, ScheduledBroadcaster, ScheduledReading};
pub use sender_session::{Inbound, SessionContext, SessionEnd, run_sender_session};
pub use weather_service::{HttpWeather, StaticWeather, WeatherProvider, weather_provider};
