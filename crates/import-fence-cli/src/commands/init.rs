//! Init command implementation.

use anyhow::{bail, Result};
use std::path::{Path, PathBuf};

const CONFIG_NAME: &str = "import-fence.toml";

const DEFAULT_CONFIG: &str = r#"# import-fence configuration
# Rules name top-level Python packages.

# Lowest severity that makes `import-fence check` exit with status 1
# fail_on = "error"

[analyzer]
# Source root; module names are relative to it (default: current directory)
# root = "./src"

# Glob patterns to exclude from analysis
exclude = [
    "**/.venv/**",
    "**/venv/**",
    "**/__pycache__/**",
]

# Respect .gitignore files
respect_gitignore = true

[dependencies]
# "dependent->dependency" edges. A package named in any edge may only be
# imported by packages that have an edge to it.
#   "*->common"    anyone may import common
#   "assembly->*"  assembly may import every restricted package
allowed = [
    # "shop->catalog",
    # "*->common",
]
# severity = "error"

[encapsulation]
# Protected packages: only names in their __all__ may be imported from outside.
packages = [
    # "auctions",
    # "auctions.domain",
]
# "friend->protected" pairs that bypass the __all__ check.
friendships = [
    # "checkout->auctions",
]
# severity = "error"
"#;

/// Runs the init command.
pub fn run(force: bool) -> Result<()> {
    let config_path = write_config(Path::new("."), force)?;

    println!("Created {}", config_path.display());
    println!("\nNext steps:");
    println!("  1. Edit {CONFIG_NAME} to declare dependencies and protected packages");
    println!("  2. Run: import-fence check");

    Ok(())
}

fn write_config(dir: &Path, force: bool) -> Result<PathBuf> {
    let config_path = dir.join(CONFIG_NAME);

    if config_path.exists() && !force {
        bail!(
            "Configuration file already exists at {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    std::fs::write(&config_path, DEFAULT_CONFIG)?;
    Ok(config_path)
}
