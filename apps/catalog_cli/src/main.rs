use std::{fs, io, path::PathBuf, sync::Arc};

use anyhow::{anyhow, bail, Context, Result};
use catalog_core::{
    config::normalize_base_url, load_settings, CatalogEvent, ClientSettings, HttpCatalogClient,
    RemoteSave, SortSpec, SubmitError, TextField, ViewCoordinator,
};
use clap::{Parser, Subcommand};
use shared::{domain::EntryId, protocol::ImageUpload};
use tokio::sync::broadcast;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "catalog-admin", about = "Manage the product/category catalog")]
struct Cli {
    /// Overrides the configured catalog API base URL.
    #[arg(long, global = true)]
    api_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    List {
        #[arg(long)]
        filter: Option<String>,
        /// `column` or `column:desc`; one of code, name, status, price, quantity, rating.
        #[arg(long)]
        sort: Option<String>,
        /// One-based page number.
        #[arg(long, default_value_t = 1)]
        page: usize,
        #[arg(long)]
        rows: Option<usize>,
    },
    Export {
        #[arg(long)]
        filter: Option<String>,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        image: PathBuf,
    },
    Delete {
        #[arg(long = "id", required = true)]
        ids: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(io::stderr)
        .init();
    let cli = Cli::parse();

    let mut settings = load_settings();
    if let Some(url) = cli.api_url.as_deref() {
        settings.api_base_url =
            normalize_base_url(url).ok_or_else(|| anyhow!("invalid --api-url '{url}'"))?;
    }
    let client = HttpCatalogClient::from_settings(&settings)?;
    let mut view = ViewCoordinator::new(Arc::new(client), settings);
    let mut events = view.subscribe_events();

    view.init().await.context("catalog list unavailable")?;

    match cli.command {
        Command::List {
            filter,
            sort,
            page,
            rows,
        } => {
            if let Some(filter) = filter {
                view.set_filter(filter);
            }
            if let Some(raw) = sort {
                let spec = SortSpec::parse(&raw).ok_or_else(|| anyhow!("invalid --sort '{raw}'"))?;
                view.set_sort(Some(spec));
            }
            if let Some(rows) = rows {
                view.set_rows_per_page(rows)?;
            }
            view.set_page(page.saturating_sub(1));
            print_page(&view);
        }
        Command::Export { filter, out } => {
            if let Some(filter) = filter {
                view.set_filter(filter);
            }
            let written = match out {
                Some(path) => {
                    let file = fs::File::create(&path)
                        .with_context(|| format!("failed to create {}", path.display()))?;
                    view.export_csv(file)?
                }
                None => view.export_csv(io::stdout().lock())?,
            };
            tracing::info!(rows = written, "exported catalog");
        }
        Command::Create { name, image } => {
            let bytes = fs::read(&image)
                .with_context(|| format!("failed to read image {}", image.display()))?;
            let file_name = image
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "image".to_string());
            let mime = mime_guess::from_path(&image)
                .first_raw()
                .unwrap_or("application/octet-stream");

            view.open_new();
            view.editor_mut().set_text(TextField::Name, name);
            view.editor_mut()
                .attach_image(ImageUpload::new(file_name, mime, bytes));
            match view.save_remote().await {
                Ok(RemoteSave::Stored(entry)) => {
                    println!("created {}", entry.id.map(|id| id.to_string()).unwrap_or_default());
                }
                Ok(RemoteSave::Reloaded { entries }) => {
                    println!("created; catalog now has {entries} entries");
                }
                Err(SubmitError::Validation(errors)) => {
                    for error in &errors.0 {
                        eprintln!("{}: {}", error.field, error.message);
                    }
                    bail!("entry not created");
                }
                Err(err) => return Err(err.into()),
            }
        }
        Command::Delete { ids } => {
            ensure_remote_delete(view.settings())?;
            let ids: Vec<EntryId> = ids.into_iter().map(EntryId::from).collect();
            view.select(&ids);
            if !view.confirm_delete_selected() {
                bail!("none of the given ids are in the catalog");
            }
            let removed = view.accept_deletion().await;
            println!("removed {} entries", removed.len());
            print_page(&view);
        }
    }

    report_toasts(&mut events);
    view.dispose();
    Ok(())
}

/// A one-shot process keeps nothing, so a local-only delete would be lost on exit.
fn ensure_remote_delete(settings: &ClientSettings) -> Result<()> {
    if !settings.remote_delete {
        bail!(
            "remote delete is disabled; set remote_delete = true in catalog.toml \
             or APP__REMOTE_DELETE=true to delete entries on the service"
        );
    }
    Ok(())
}

fn print_page(view: &ViewCoordinator) {
    println!("{:<12} {:<32} {:<10}", "Code", "Name", "Status");
    for entry in view.page_rows() {
        println!(
            "{:<12} {:<32} {:<10}",
            entry.id.as_ref().map(|id| id.as_str()).unwrap_or_default(),
            entry.name,
            entry.inventory_status
        );
    }
    println!("{}", view.page_report());
}

fn report_toasts(events: &mut broadcast::Receiver<CatalogEvent>) {
    while let Ok(event) = events.try_recv() {
        if let CatalogEvent::Toast(toast) = event {
            eprintln!("[{}] {}", toast.summary, toast.detail);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delete_requires_remote_delete() {
        let err = ensure_remote_delete(&ClientSettings::default()).expect_err("should refuse");
        assert!(err.to_string().contains("remote_delete"));

        let enabled = ClientSettings {
            remote_delete: true,
            ..ClientSettings::default()
        };
        assert!(ensure_remote_delete(&enabled).is_ok());
    }
}
