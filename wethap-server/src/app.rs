use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::configs::{SchemaManager, Settings, Storage};
use crate::docs::docs_router;
use crate::handles::*;
use crate::repositories::{InfoRepository, ManualInfoRepository, SenderRepository};
use crate::services::{
    Clock, ConnectionRegistry, DailySchedule, IdentityResolver, KeepAlive, ReadingService,
    RenameCoordinator, ScheduledBroadcaster, SessionContext, SystemClock, WeatherProvider,
    weather_provider,
};

/// Everything the routes and background tasks share. Built once per process.
pub struct AppContext {
    pub settings: Arc<Settings>,
    pub storage: Arc<Storage>,
    pub registry: Arc<ConnectionRegistry>,
    pub sender_repository: Arc<SenderRepository>,
    pub info_repository: Arc<InfoRepository>,
    pub manual_info_repository: Arc<ManualInfoRepository>,
    pub resolver: Arc<IdentityResolver>,
    pub reading_service: Arc<ReadingService>,
    pub rename_coordinator: Arc<RenameCoordinator>,
    pub schedule: DailySchedule,
}

impl AppContext {
    pub fn new(
        settings: Arc<Settings>,
        storage: Arc<Storage>,
        weather: Arc<dyn WeatherProvider>,
    ) -> anyhow::Result<Self> {
        let schedule = DailySchedule::from_settings(&settings.schedule)?;
        let registry = Arc::new(ConnectionRegistry::new());

        let sender_repository = Arc::new(SenderRepository::new(storage.clone()));
        let info_repository = Arc::new(InfoRepository::new(storage.clone()));
        let manual_info_repository = Arc::new(ManualInfoRepository::new(storage.clone()));

        let resolver = Arc::new(IdentityResolver::new(
            storage.clone(),
            sender_repository.clone(),
            registry.clone(),
        ));
        let reading_service = Arc::new(ReadingService::new(
            storage.clone(),
            info_repository.clone(),
            manual_info_repository.clone(),
            weather,
            schedule.offset(),
        ));
        let rename_coordinator = Arc::new(RenameCoordinator::new(
            storage.clone(),
            sender_repository.clone(),
            registry.clone(),
        ));

        Ok(Self {
            settings,
            storage,
            registry,
            sender_repository,
            info_repository,
            manual_info_repository,
            resolver,
            reading_service,
            rename_coordinator,
            schedule,
        })
    }

    pub fn session_context(&self) -> SessionContext {
        SessionContext {
            registry: self.registry.clone(),
            resolver: self.resolver.clone(),
            readings: self.reading_service.clone(),
            handshake_timeout: Duration::from_secs(self.settings.connection.handshake_timeout_secs),
        }
    }

    pub fn router(&self) -> Router {
        let ws = sender_ws_router(SenderWsState {
            context: Arc::new(self.session_context()),
        });

        let senders = sender_router(SenderState {
            sender_repository: self.sender_repository.clone(),
            registry: self.registry.clone(),
            rename_coordinator: self.rename_coordinator.clone(),
        });

        let infos = info_router(InfoState {
            reading_service: self.reading_service.clone(),
            info_repository: self.info_repository.clone(),
            manual_info_repository: self.manual_info_repository.clone(),
        });

        let routes = Router::new().merge(infos).merge(senders).merge(ws).merge(docs_router());

        let prefix = self.settings.route_prefix();
        let app = if prefix.is_empty() {
            routes
        } else {
            Router::new().nest(&prefix, routes)
        };

        app.layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http())
    }

    /// Starts the schedule and keep-alive loops on the runtime.
    pub fn spawn_background(&self, clock: Arc<dyn Clock>) {
        let broadcaster = ScheduledBroadcaster::new(
            self.schedule.clone(),
            self.registry.clone(),
            clock,
            time::Duration::seconds(self.settings.schedule.max_lateness_secs as i64),
        );
        tokio::spawn(broadcaster.run());

        let keep_alive = KeepAlive::new(
            self.registry.clone(),
            Duration::from_secs(self.settings.connection.keep_alive_secs.max(1)),
        );
        tokio::spawn(keep_alive.run());
    }
}

pub async fn create_app(settings: &Arc<Settings>) -> anyhow::Result<Router> {
    let storage = Arc::new(Storage::new(settings.database.clone(), SchemaManager::default()).await?);
    let weather: Arc<dyn WeatherProvider> = Arc::from(weather_provider(&settings.weather)?);

    let context = AppContext::new(settings.clone(), storage, weather)?;
    context.spawn_background(Arc::new(SystemClock));

    Ok(context.router())
}
