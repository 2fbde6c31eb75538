use std::net::TcpListener;
use std::sync::Arc;

use actix_governor::Governor;
use actix_web::web::Data;
use actix_web::{App, HttpServer};
use anyhow::Context;

use crate::model::configuration::ApplicationConfiguration;
use crate::rate_limiting::build_rate_limiting_conf;
use crate::routes;
use crate::services::ocr::TesseractExtractor;
use crate::services::uploads::ExportStore;
use crate::services::GradeService;
use crate::templates::Templates;

#[derive(Clone)]
pub struct ApplicationServices {
    pub grade_service: GradeService,
    pub templates: Templates,
}

/// Wire the services together, creating the upload directory if needed
pub fn build_services(configuration: &ApplicationConfiguration) -> anyhow::Result<ApplicationServices> {
    let store = ExportStore::new(&configuration.upload_dir);
    store.ensure_exists().with_context(|| {
        format!(
            "Could not create the upload directory {}",
            configuration.upload_dir.display()
        )
    })?;

    let extractor = Arc::new(TesseractExtractor::new(configuration.ocr.clone()));
    let templates = Templates::new().context("Could not compile the HTML templates")?;

    Ok(ApplicationServices {
        grade_service: GradeService::new(extractor, store),
        templates,
    })
}

pub async fn startup(
    services: ApplicationServices,
    configuration: ApplicationConfiguration,
    listener: TcpListener,
) -> anyhow::Result<()> {
    let governor_conf = build_rate_limiting_conf(&configuration.rate_limiting)?;
    let services = Data::new(services);
    let configuration = Data::new(configuration);

    HttpServer::new(move || {
        App::new()
            .wrap(Governor::new(&governor_conf))
            .wrap(tracing_actix_web::TracingLogger::default())
            .app_data(services.clone())
            .app_data(configuration.clone())
            .configure(routes::configure)
    })
    .listen(listener)?
    .run()
    .await?;

    Ok(())
}
