//! Subcommands of the `icon-store` binary. Results go to stdout as JSON.

use std::path::PathBuf;

use clap::Subcommand;
use colored::Colorize;
use serde::Serialize;

use icon_store::{ApiResponse, IconStoreError, LocalIconStore, UploadedFile};

#[derive(Subcommand, Debug, Clone)]
pub enum IconCommand {
    /// Upload one or more SVG files
    Upload {
        /// Files to upload
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Target set (omit for the local set)
        #[arg(long)]
        set: Option<String>,
    },
    /// List icon sets with counts
    Sets,
    /// List the icons of one set
    Icons {
        /// Set prefix (omit for the local set)
        set: Option<String>,
    },
    /// List every icon across all sets
    All,
    /// Print the stored SVG of `prefix:basename`
    Get { icon_name: String },
    /// Delete an icon
    Delete { icon_name: String },
    /// Move an icon into another set
    Move {
        icon_name: String,
        /// Target set (omit for the local set)
        target: Option<String>,
    },
    /// Create an empty set
    CreateSet { name: String },
    /// Rename a set
    RenameSet { old_name: String, new_name: String },
    /// Search basenames, optionally scoped with `prefix:term`
    Search { query: String },
    /// Drop every cached listing
    ClearCache,
    /// Print the detected MIME type of a file
    Mime { path: PathBuf },
}

/// Run one command; `Ok(false)` means the store reported a failure
pub async fn run(
    store: &LocalIconStore,
    cmd: IconCommand,
) -> Result<bool, Box<dyn std::error::Error>> {
    match cmd {
        IconCommand::Upload { files, set } => upload(store, files, set.as_deref()).await,
        IconCommand::Sets => emit(ApiResponse::ok("Icon sets", store.list_sets().await)),
        IconCommand::Icons { set } => {
            emit(ApiResponse::ok("Icons", store.list_icons(set.as_deref()).await))
        }
        IconCommand::All => emit(ApiResponse::ok("All icons", store.list_all_icons().await)),
        IconCommand::Get { icon_name } => match store.get_icon_content(&icon_name).await {
            Ok(svg) => {
                println!("{}", svg);
                Ok(true)
            }
            Err(e) => emit(ApiResponse::<()>::from_result(Err(e), "")),
        },
        IconCommand::Delete { icon_name } => emit(ApiResponse::from_result(
            store.delete(&icon_name).await,
            "Icon deleted successfully",
        )),
        IconCommand::Move { icon_name, target } => emit(ApiResponse::from_result(
            store.move_icon(&icon_name, target.as_deref()).await,
            "Icon moved successfully",
        )),
        IconCommand::CreateSet { name } => emit(ApiResponse::from_result(
            store.create_set(&name).await,
            "Icon set created successfully",
        )),
        IconCommand::RenameSet { old_name, new_name } => emit(ApiResponse::from_result(
            store.rename_set(&old_name, &new_name).await,
            "Icon set renamed successfully",
        )),
        IconCommand::Search { query } => emit(ApiResponse::from_result(
            store.search(&query).await,
            "Search results",
        )),
        IconCommand::ClearCache => {
            store.clear_cache();
            emit(ApiResponse::ok("Cache cleared", ()))
        }
        IconCommand::Mime { path } => {
            let result = store.detect_mime(&path).ok_or_else(|| IconStoreError::ReadFailed {
                message: format!("{} is not a readable file", path.display()),
            });
            emit(ApiResponse::from_result(result, "MIME type detected"))
        }
    }
}

async fn upload(
    store: &LocalIconStore,
    paths: Vec<PathBuf>,
    set: Option<&str>,
) -> Result<bool, Box<dyn std::error::Error>> {
    let files: Vec<UploadedFile> = paths
        .iter()
        .map(|path| {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            UploadedFile::from_path(name, path)
        })
        .collect();

    if let [file] = files.as_slice() {
        let result = store.upload_verified(file, set).await;
        if let Ok(uploaded) = &result {
            eprintln!("{} Uploaded {}", "✓".green(), uploaded.icon_name.cyan());
        }
        return emit(ApiResponse::from_result(result, "Icon uploaded successfully"));
    }

    let report = store.upload_batch(&files, set).await;
    for failure in &report.errors {
        eprintln!(
            "{} {}: {}",
            "✗".red(),
            failure.filename,
            failure.message.dimmed()
        );
    }
    let success = report.success;
    print_json(&report)?;
    Ok(success)
}

fn emit<T: Serialize>(response: ApiResponse<T>) -> Result<bool, Box<dyn std::error::Error>> {
    if !response.success {
        eprintln!("{} {}", "✗".red(), response.message);
    }
    print_json(&response)?;
    Ok(response.success)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
