//! Human-readable terminal renderer.

use std::path::Path;

use anyhow::Result;
use owo_colors::OwoColorize as _;

use crate::application::services::pipeline::DeploymentSummary;
use crate::domain::analysis::RepoAnalysis;
use crate::domain::config::{AutoshipConfig, CONFIG_PATH_ENV, VALID_CONFIG_KEYS, config_value};
use crate::domain::terraform::ProvisioningConfig;
use crate::output::OutputContext;

/// Renders domain types as human-readable terminal output using `OutputContext`.
pub struct HumanRenderer<'a> {
    ctx: &'a OutputContext,
}

fn ports_display(ports: &[u16]) -> String {
    ports
        .iter()
        .map(u16::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn or_none(value: Option<&str>) -> &str {
    value.unwrap_or("(none)")
}

impl<'a> HumanRenderer<'a> {
    /// Create a new `HumanRenderer` wrapping the given output context.
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self { ctx }
    }

    /// Render the CLI version.
    pub fn render_version(&self, version: &str) {
        println!("autoship {version}");
    }

    /// Render the outcome of a deployment.
    pub fn render_summary(&self, summary: &DeploymentSummary) {
        println!();
        self.ctx.header("Deployment complete");
        self.ctx.kv("URL:        ", &summary.url);
        self.ctx.kv("Framework:  ", summary.framework.as_str());
        self.ctx.kv("Port:       ", &summary.primary_port.to_string());
        self.ctx.kv("Remote dir: ", &summary.report.remote_root);
        self.ctx
            .kv("Uploaded:   ", &format!("{} files", summary.report.files_uploaded));
        if summary.rewrote_entry_point {
            self.ctx
                .info("Entry point rewritten to listen on the public interface");
        }

        for advisory in &summary.report.advisories {
            self.ctx.warn(&advisory.to_string());
        }

        if !self.ctx.quiet && !summary.report.process_listing.trim().is_empty() {
            println!();
            println!("  {}", "Running processes:".style(self.ctx.styles.bold));
            for line in summary.report.process_listing.lines() {
                println!("    {}", line.style(self.ctx.styles.dim));
            }
        }

        println!();
        self.ctx.info(&format!(
            "Terraform state kept in {}",
            summary.terraform_workspace.display()
        ));
        self.ctx.info(&format!(
            "Tear down with: terraform -chdir={} destroy",
            summary.terraform_workspace.display()
        ));
    }

    /// Render the tree listing and the analysis drawn from it.
    pub fn render_analysis(&self, tree_listing: &str, analysis: &RepoAnalysis) {
        if !self.ctx.quiet {
            println!();
            for line in tree_listing.lines() {
                println!("  {line}");
            }
            println!();
        }
        self.ctx.kv("Framework:   ", analysis.framework.as_str());
        self.ctx.kv("Ports:       ", &ports_display(&analysis.ports));
        self.ctx
            .kv("Manifest:    ", or_none(analysis.dependency_manifest.as_deref()));
        self.ctx.kv("Entry point: ", or_none(analysis.main_file.as_deref()));
        if analysis.needs_localhost_rewrite {
            self.ctx
                .warn("Entry point binds to a loopback address; it will be rewritten on deploy");
        }
    }

    /// Render the generated provisioning payload.
    pub fn render_plan(&self, plan: &ProvisioningConfig) {
        self.ctx.kv("Provider:  ", &plan.provider.to_string());
        self.ctx.kv("Region:    ", &plan.region);
        self.ctx.kv("Instance:  ", &plan.instance_size);
        self.ctx.kv("Framework: ", plan.framework.as_str());
        self.ctx.kv("Ingress:   ", &ports_display(&plan.ingress_ports));
        self.ctx.kv("Suffix:    ", &plan.suffix);
        println!();
        // The payload is the product of this command; print it even when quiet.
        println!("{}", plan.payload);
    }

    /// Render the current configuration.
    ///
    /// # Errors
    ///
    /// Never fails; the signature matches the JSON renderer.
    pub fn render_config(&self, config: &AutoshipConfig, path: &Path) -> Result<()> {
        println!();
        println!(
            "  {}",
            format!("Configuration ({})", path.display()).style(self.ctx.styles.header)
        );
        println!();
        for key in VALID_CONFIG_KEYS {
            let value = config_value(config, key).unwrap_or_default();
            println!("  {:<34} {value}", format!("{key}:"));
        }
        println!();
        println!("  {}", "Environment:".style(self.ctx.styles.bold));
        println!(
            "    {:<32} {}",
            format!("{CONFIG_PATH_ENV}:"),
            std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| "(not set)".to_string())
        );
        let key_state = if std::env::var(&config.classifier.api_key_env).is_ok() {
            "(set)"
        } else {
            "(not set, offline classifier)"
        };
        println!(
            "    {:<32} {key_state}",
            format!("{}:", config.classifier.api_key_env)
        );
        Ok(())
    }
}
