//! `docsnag sites` – list site profiles.

use docsnag_core::config::SnagConfig;

pub fn run_sites(cfg: &SnagConfig) {
    if cfg.sites.is_empty() {
        println!("No site profiles configured.");
        return;
    }
    for site in &cfg.sites {
        println!("{}", site.name);
        println!("  pages:     {}", site.page_prefixes.join(", "));
        println!("  calls:     {}", site.intercept_patterns.join(", "));
        println!("  container: {}", site.container_selector);
    }
}
