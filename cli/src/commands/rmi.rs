//! `wharf rmi` command — remove one or more images.

use std::path::Path;

use clap::Args;
use wharf_engine::DeleteEffect;

#[derive(Args)]
pub struct RmiArgs {
    /// Image references or ids to remove
    #[arg(required = true)]
    pub images: Vec<String>,

    /// Force removal (multi-repo aliases, stopped containers)
    #[arg(short, long)]
    pub force: bool,

    /// Do not prune untagged parent images
    #[arg(long)]
    pub no_prune: bool,
}

pub fn execute(root: &Path, args: RmiArgs) -> Result<(), Box<dyn std::error::Error>> {
    let handles = super::open_engine(root)?;

    let mut errors: Vec<String> = Vec::new();

    for name in &args.images {
        match handles.deleter.delete_image(name, true, args.force, args.no_prune) {
            Ok(effects) if effects.is_empty() => {
                errors.push(format!("Conflict, {name} wasn't deleted"));
            }
            Ok(effects) => {
                for effect in effects {
                    match effect {
                        DeleteEffect::Untagged { reference } => {
                            println!("Untagged: {reference}");
                        }
                        DeleteEffect::Deleted { id } => {
                            println!("Deleted: {id}");
                        }
                    }
                }
            }
            Err(e) => {
                errors.push(e.to_string());
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors.join("\n").into())
    }
}
