use anyhow::Result;
use dotenvy::dotenv;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use fleet_maintenance::{
    build_router,
    config::{DatabaseConfig, EnvironmentConfig, StoreBackend},
    database::DatabaseConnection,
    repositories::{FleetStore, MemoryFleetStore, PgFleetStore},
    state::AppState,
    utils::clock::SystemClock,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();

    // Configurar logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")))
        .init();

    info!("🚚 Fleet Maintenance API");
    info!("========================");

    let config = EnvironmentConfig::from_env()?;

    let store: Arc<dyn FleetStore> = match config.store_backend {
        StoreBackend::Postgres => {
            let pool = DatabaseConnection::connect(&DatabaseConfig::from_env()?).await.map_err(|e| {
                error!("❌ Error conectando a la base de datos: {}", e);
                e
            })?;
            Arc::new(PgFleetStore::new(pool))
        }
        StoreBackend::Memory => {
            warn!("⚠️ Usando almacén en memoria, los datos se pierden al reiniciar");
            Arc::new(MemoryFleetStore::new())
        }
    };

    let addr: SocketAddr = config.server_url().parse()?;
    info!("🕗 Zona horaria civil: UTC{}", config.civil_offset);

    let (app_state, audit_worker) = AppState::new(config, store, Arc::new(SystemClock));
    let audit = app_state.audit.clone();
    let app = build_router(app_state);

    info!("🌐 Servidor iniciando en http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| {
            error!("❌ Error del servidor: {}", e);
            e
        })?;

    // Vaciar el audit log pendiente antes de salir
    audit.flush().await;
    drop(audit);
    if let Err(e) = audit_worker.await {
        warn!("⚠️ Worker de audit log terminó con error: {}", e);
    }

    info!("👋 Servidor terminado");
    Ok(())
}

/// Señal de apagado graceful
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("❌ No se pudo escuchar Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("❌ No se pudo instalar el handler de SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("🛑 Señal Ctrl+C recibida, apagando servidor...");
        },
        _ = terminate => {
            info!("🛑 Señal de terminación recibida, apagando servidor...");
        },
    }
}
