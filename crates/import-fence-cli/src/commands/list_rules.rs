//! List rules command implementation.

use import_fence_core::RULES;

/// Runs the list-rules command.
pub fn run() {
    println!("Available rules:\n");
    println!("{:<10} {:<25} Description", "Code", "Name");
    println!("{}", "-".repeat(80));

    for rule in RULES {
        println!("{:<10} {:<25} {}", rule.code, rule.name, rule.description);
    }

    println!("\nConfigure them in import-fence.toml:");
    println!("  [dependencies]   allowed = [\"shop->catalog\", \"*->common\"]");
    println!("  [encapsulation]  packages = [\"auctions\"], friendships = [\"checkout->auctions\"]");
}
