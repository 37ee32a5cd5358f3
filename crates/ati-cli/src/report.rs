//! Markdown market report.

use std::fmt::Write as _;

use ati_analytics::{Analytics, Metric};
use chrono::Utc;

const REPORT_BRANDS: usize = 10;
const REPORT_POSTS: usize = 5;

pub(crate) fn run_report(analytics: &Analytics) -> anyhow::Result<()> {
    print!("{}", render_report(analytics)?);
    Ok(())
}

/// Build the report as a markdown document.
pub(crate) fn render_report(analytics: &Analytics) -> anyhow::Result<String> {
    let stats = analytics.market_stats()?;
    let mut brands = analytics.list_brands()?;
    let trend = analytics.market_trend()?;
    let correlation = analytics.correlation(Metric::Ati, Metric::Engagement)?;
    let high_ati = analytics.high_ati_posts(REPORT_POSTS)?;

    let mut out = String::new();
    let now = Utc::now().format("%Y-%m-%d %H:%M UTC");

    writeln!(out, "# Content Homogeneity Report")?;
    writeln!(out)?;
    writeln!(out, "**Generated**: {now}")?;
    writeln!(
        out,
        "**Coverage**: {} brands, {} posts",
        stats.total_brands, stats.total_posts
    )?;
    writeln!(out)?;

    writeln!(out, "## Market")?;
    writeln!(out)?;
    writeln!(out, "| Metric | Value |")?;
    writeln!(out, "|--------|-------|")?;
    writeln!(out, "| Average ATI | {:.2} |", stats.avg_ati)?;
    writeln!(out, "| Average DS | {:.4} |", stats.avg_ds)?;
    writeln!(out, "| ATI std dev (brands) | {:.2} |", stats.ati_std_dev)?;
    writeln!(out, "| High-risk threshold | {:.2} |", stats.high_risk_threshold)?;
    writeln!(out, "| High-risk brands | {} |", stats.high_risk_brand_count)?;
    writeln!(out, "| Convergence index | {:.1} |", stats.convergence_index)?;
    writeln!(out)?;

    brands.sort_by(|a, b| b.mean_ati.total_cmp(&a.mean_ati).then_with(|| a.brand.cmp(&b.brand)));
    writeln!(out, "## Most homogeneous brands")?;
    writeln!(out)?;
    if brands.is_empty() {
        writeln!(out, "_No brands._")?;
    } else {
        writeln!(out, "| Brand | ATI | DS | Posts | High risk |")?;
        writeln!(out, "|-------|-----|----|-------|-----------|")?;
        for b in brands.iter().take(REPORT_BRANDS) {
            let flag = if b.mean_ati >= stats.high_risk_threshold {
                "yes"
            } else {
                ""
            };
            writeln!(
                out,
                "| {} | {:.2} | {:.4} | {} | {flag} |",
                b.display_name, b.mean_ati, b.mean_ds, b.post_count
            )?;
        }
    }
    writeln!(out)?;

    writeln!(out, "## Trend")?;
    writeln!(out)?;
    writeln!(out, "| Period | ATI | Novelty | Diversity | Posts |")?;
    writeln!(out, "|--------|-----|---------|-----------|-------|")?;
    for t in &trend {
        writeln!(
            out,
            "| {} | {:.2} | {:.3} | {:.3} | {} |",
            t.period, t.mean_ati, t.mean_novelty, t.mean_diversity, t.post_count
        )?;
    }
    writeln!(out)?;

    writeln!(out, "## ATI and engagement")?;
    writeln!(out)?;
    writeln!(
        out,
        "Spearman {:.4}, Pearson {:.4} over {} posts.",
        correlation.spearman, correlation.pearson, correlation.sample_size
    )?;
    writeln!(out)?;

    writeln!(out, "## Highest-ATI posts")?;
    writeln!(out)?;
    for p in &high_ati {
        let date = p.posted_on.as_deref().unwrap_or("undated");
        write!(out, "- **{}** ({date}, ATI {:.2})", p.brand, p.ati)?;
        if let Some(url) = &p.url {
            write!(out, " [post]({url})")?;
        }
        writeln!(out)?;
    }

    Ok(out)
}
