//! Table-printing handlers for the read-only query commands.

use ati_analytics::{Analytics, Metric};

/// Shorten `text` to `max` characters, marking the cut with `...`.
pub(crate) fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        format!("{}...", text.chars().take(max).collect::<String>())
    } else {
        text.to_string()
    }
}

pub(crate) fn run_brands(analytics: &Analytics) -> anyhow::Result<()> {
    let brands = analytics.list_brands()?;
    if brands.is_empty() {
        println!("no brands found; check ATI_POSTS_SOURCES");
        return Ok(());
    }

    println!(
        "{:<25}{:<25}{:>8}{:>10}{:>12}{:>8}",
        "BRAND", "NAME", "ATI", "DS", "ENGAGEMENT", "POSTS"
    );
    for b in &brands {
        println!(
            "{:<25}{:<25}{:>8.2}{:>10.4}{:>12.4}{:>8}",
            truncate(&b.brand, 23),
            truncate(&b.display_name, 23),
            b.mean_ati,
            b.mean_ds,
            b.mean_engagement,
            b.post_count
        );
    }
    Ok(())
}

pub(crate) fn run_brand(analytics: &Analytics, brand: &str) -> anyhow::Result<()> {
    let detail = analytics.brand_detail(brand)?;
    let c = &detail.comparison;

    println!("Brand: {} ({})", detail.display_name, detail.aggregate.brand);
    println!("Posts: {}", detail.aggregate.post_count);
    println!(
        "ATI:   {:.2} (market {:.2}, {:+.2} / {:+.1}%)",
        detail.aggregate.mean_ati, c.market_avg_ati, c.ati_delta, c.ati_delta_pct
    );
    println!(
        "DS:    {:.4} (market {:.4}, {:+.4} / {:+.1}%)",
        detail.aggregate.mean_ds, c.market_avg_ds, c.ds_delta, c.ds_delta_pct
    );
    if !detail.ati_trend.is_empty() {
        let stages: Vec<String> = detail.ati_trend.iter().map(|v| format!("{v:.2}")).collect();
        println!("Trend: {}", stages.join(" -> "));
    }

    for (title, posts) in [
        ("Most average posts", &detail.most_average_posts),
        ("Most novel posts", &detail.most_novel_posts),
    ] {
        println!();
        println!("{title}:");
        println!("{:<12}{:>8}{:>8}{:>10}  CAPTION", "DATE", "ATI", "DS", "NOVELTY");
        for p in posts {
            println!(
                "{:<12}{:>8.2}{:>8.3}{:>10.3}  {}",
                p.posted_on.as_deref().unwrap_or("-"),
                p.ati,
                p.ds,
                p.novelty,
                truncate(&p.caption, 60)
            );
        }
    }
    Ok(())
}

pub(crate) fn run_similar(analytics: &Analytics, brand: &str, top: usize) -> anyhow::Result<()> {
    let similar = analytics.similar_brands(brand, top)?;
    if similar.is_empty() {
        println!("no other brands to compare with '{brand}'");
        return Ok(());
    }

    println!(
        "{:<25}{:>12}{:>10}{:>10}{:>10}",
        "BRAND", "SIMILARITY", "ATI", "ATI DIFF", "DS DIFF"
    );
    for s in &similar {
        println!(
            "{:<25}{:>12.4}{:>10.2}{:>10.2}{:>10.4}",
            truncate(&s.display_name, 23),
            s.similarity,
            s.mean_ati,
            s.ati_diff,
            s.ds_diff
        );
    }
    Ok(())
}

pub(crate) fn run_stats(analytics: &Analytics) -> anyhow::Result<()> {
    let stats = analytics.market_stats()?;
    println!("{:<28}{}", "Brands", stats.total_brands);
    println!("{:<28}{}", "Posts", stats.total_posts);
    println!("{:<28}{:.2}", "Average ATI (posts)", stats.avg_ati);
    println!("{:<28}{:.2}", "Average ATI (brands)", stats.brand_avg_ati);
    println!("{:<28}{:.4}", "Average DS", stats.avg_ds);
    println!("{:<28}{:.2}", "ATI std dev", stats.ati_std_dev);
    println!(
        "{:<28}{:.2} (z = {})",
        "High-risk threshold", stats.high_risk_threshold, stats.high_risk_z
    );
    println!("{:<28}{}", "High-risk brands", stats.high_risk_brand_count);
    println!("{:<28}{:.1}", "Convergence index", stats.convergence_index);
    Ok(())
}

pub(crate) fn run_trend(analytics: &Analytics) -> anyhow::Result<()> {
    let trend = analytics.market_trend()?;
    println!(
        "{:<14}{:>8}{:>10}{:>11}{:>8}",
        "PERIOD", "ATI", "NOVELTY", "DIVERSITY", "POSTS"
    );
    for t in &trend {
        println!(
            "{:<14}{:>8.2}{:>10.3}{:>11.3}{:>8}",
            t.period, t.mean_ati, t.mean_novelty, t.mean_diversity, t.post_count
        );
    }
    Ok(())
}

pub(crate) fn run_map(analytics: &Analytics, k: Option<usize>) -> anyhow::Result<()> {
    let map = analytics.market_map(k)?;
    println!("{} clusters", map.cluster_count);
    println!(
        "{:<25}{:>9}{:>10}{:>10}{:>8}",
        "BRAND", "CLUSTER", "DS", "ATI", "POSTS"
    );
    let mut points: Vec<_> = map.points.iter().collect();
    points.sort_by(|a, b| a.cluster.cmp(&b.cluster).then_with(|| a.brand.cmp(&b.brand)));
    for p in points {
        println!(
            "{:<25}{:>9}{:>10.4}{:>10.2}{:>8}",
            truncate(&p.brand, 23),
            p.cluster,
            p.x,
            p.y,
            p.post_count
        );
    }
    Ok(())
}

pub(crate) fn run_embedding_map(analytics: &Analytics, k: Option<usize>) -> anyhow::Result<()> {
    let map = analytics.embedding_map(k)?;
    println!(
        "{} clusters, PCA explains {:.1}% of variance",
        map.cluster_count,
        map.explained_variance * 100.0
    );
    println!(
        "{:<25}{:>9}{:>10}{:>10}{:>8}",
        "BRAND", "CLUSTER", "PC1", "PC2", "POSTS"
    );
    let mut points: Vec<_> = map.points.iter().collect();
    points.sort_by(|a, b| a.cluster.cmp(&b.cluster).then_with(|| a.brand.cmp(&b.brand)));
    for p in points {
        println!(
            "{:<25}{:>9}{:>10.4}{:>10.4}{:>8}",
            truncate(&p.brand, 23),
            p.cluster,
            p.x,
            p.y,
            p.post_count
        );
    }
    Ok(())
}

pub(crate) fn run_deciles(analytics: &Analytics, metric: Metric) -> anyhow::Result<()> {
    let buckets = analytics.deciles(metric)?;
    if buckets.iter().all(|b| b.post_count == 0) {
        println!("no {metric} values to bucket");
        return Ok(());
    }

    println!(
        "{:<8}{:>12}{:>12}{:>12}{:>8}{:>12}{:>12}",
        "DECILE", "LOWER", "UPPER", "MEAN", "POSTS", "ENG MEAN", "ENG MEDIAN"
    );
    for b in &buckets {
        println!(
            "{:<8}{:>12.4}{:>12.4}{:>12.4}{:>8}{:>12.4}{:>12.4}",
            b.decile, b.lower, b.upper, b.mean, b.post_count, b.engagement_mean, b.engagement_median
        );
    }
    Ok(())
}

pub(crate) fn run_correlation(analytics: &Analytics, a: Metric, b: Metric) -> anyhow::Result<()> {
    let result = analytics.correlation(a, b)?;
    println!("{a} vs {b} (n = {})", result.sample_size);
    println!("{:<12}{:.4}", "Spearman", result.spearman);
    println!("{:<12}{:.4}", "Pearson", result.pearson);
    println!(
        "{:<12}{b} = {:.4} * {a} + {:.4}",
        "Fit", result.slope, result.intercept
    );
    Ok(())
}

pub(crate) fn run_engagement(analytics: &Analytics) -> anyhow::Result<()> {
    let scaling = analytics.engagement_scaling()?;
    println!("Comment weight sweep (n = {}):", scaling.sample_size);
    println!("{:<10}{:>12}", "WEIGHT", "R WITH ATI");
    for w in &scaling.sweep {
        let marker = if (w.comment_weight - scaling.recommended_weight).abs() < f64::EPSILON {
            "  <- recommended"
        } else {
            ""
        };
        println!("{:<10}{:>12.4}{marker}", w.comment_weight, w.correlation);
    }

    let tail = analytics.engagement_tail()?;
    println!();
    println!(
        "Late-entry brands: {} ({} posts)",
        tail.late_entry_brand_count, tail.late_entry_post_count
    );
    println!(
        "Engagement std dev: late {:.4}, other {:.4}, ratio {:.2}",
        tail.late_entry_std_dev, tail.other_std_dev, tail.std_dev_ratio
    );
    println!(
        "Extreme posts (top 5%): {} at engagement >= {:.4}",
        tail.extreme_post_count, tail.extreme_threshold
    );
    for b in &tail.late_entry_brands {
        println!(
            "  {:<25}{:<12}{:>6}{:>8.2}{:>10.4}",
            truncate(&b.brand, 23),
            b.first_post_on.as_deref().unwrap_or("-"),
            b.post_count,
            b.mean_ati,
            b.mean_engagement
        );
    }
    Ok(())
}
