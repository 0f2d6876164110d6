use flyergen::{
    logger::{self, LogLevel, LoggerConfig},
    FlyerError, GenerationRequest, HttpGenerationService, ImageRef, ServiceConfig, Session, Slot,
};
use std::env;
use std::fs;
use std::sync::Arc;

fn usage() -> String {
    "usage: flyergen <prompt> <model> <aspect-ratio>".to_string()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dotenv_loaded = dotenv::dotenv().is_ok();

    let level = env::var("FLYERGEN_LOG")
        .ok()
        .and_then(|name| LogLevel::parse(&name))
        .unwrap_or(LogLevel::Info);
    let mut log_config = match env::var("FLYERGEN_LOG_FORMAT").as_deref() {
        Ok("json") => LoggerConfig::production(),
        _ => LoggerConfig::development(),
    }
    .with_level(level);
    if let Ok(path) = env::var("FLYERGEN_LOG_FILE") {
        log_config = log_config.with_file_output(&path);
    }
    logger::init_with_config(log_config)?;

    if dotenv_loaded {
        log::info!("✅ .env file loaded successfully");
    } else {
        log::warn!("⚠️  No .env file found, using system environment variables");
    }

    let args: Vec<String> = env::args().skip(1).collect();
    let (prompt, model, aspect_ratio) = match args.as_slice() {
        [prompt, model, aspect_ratio, ..] => (prompt, model, aspect_ratio),
        _ => {
            log::error!("❌ {}", usage());
            return Err(usage().into());
        }
    };

    let config = ServiceConfig::from_env();
    logger::log_config_info(&config);

    let service = match HttpGenerationService::new(&config) {
        Ok(service) => Arc::new(service),
        Err(e) => {
            log::error!("❌ {}", e);
            log::warn!("💡 Set FLYERGEN_BASE_URL to the generation service address");
            return Err(e.into());
        }
    };

    let session = Session::new(service, config.poll.clone());

    let teardown = session.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("Interrupted, tearing the session down");
            teardown.teardown();
        }
    });

    let request = GenerationRequest::new(prompt.as_str())
        .with_model(model.as_str())
        .with_aspect_ratio(aspect_ratio.as_str());

    let generated = {
        let _timer = logger::timer("Generation");
        session.generate(request).await
    };
    if let Err(e) = generated {
        report_failure(&session, &e);
        return Err(e.into());
    }
    print_gallery(&session, "generated");

    if let Ok(edit_prompt) = env::var("FLYERGEN_DEMO_EDIT") {
        session.select_slot(Slot::Img1)?;
        session.set_edit_prompt(&edit_prompt);
        match session.apply_edit().await {
            Ok(_) => print_gallery(&session, "edited"),
            Err(e) => report_failure(&session, &e),
        }
    }

    if env::var("FLYERGEN_DEMO_REGENERATE").map_or(false, |v| v == "true") {
        let _timer = logger::timer("Regenerate");
        match session.regenerate().await {
            Ok(_) => print_gallery(&session, "regenerated"),
            Err(e) => report_failure(&session, &e),
        }
    }

    session.teardown();
    Ok(())
}

fn report_failure(session: &Session<HttpGenerationService>, error: &FlyerError) {
    match session.view().notice {
        Some(notice) => log::error!("❌ {}", notice),
        None => log::error!("❌ {}", error),
    }
}

fn print_gallery(session: &Session<HttpGenerationService>, label: &str) {
    let view = session.view();
    log::info!("🖼️  Designs {} for \"{}\":", label, view.prompt);
    for (slot, image) in &view.visible_slots {
        match save_inline(slot, image, label) {
            Some(path) => log::info!("  {} -> saved to {}", slot, path),
            None => log::info!("  {} -> {}", slot, image),
        }
    }
}

/// Writes inline data-URI designs to disk; URLs are left alone.
fn save_inline(slot: &Slot, image: &ImageRef, label: &str) -> Option<String> {
    let bytes = match image.decode_data_uri()? {
        Ok(bytes) => bytes,
        Err(e) => {
            log::warn!("⚠️  Could not decode {}: {}", slot, e);
            return None;
        }
    };
    let path = format!("{}_{}.{}", label, slot, image.extension());
    match fs::write(&path, bytes) {
        Ok(()) => Some(path),
        Err(e) => {
            log::warn!("⚠️  Could not write {}: {}", path, e);
            None
        }
    }
}
