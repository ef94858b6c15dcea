use anyhow::Result;
use dlmm_range_advisor::{
    advisor::Advisor,
    config::AppConfig,
    sources::FixtureSource,
    utils,
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    utils::init_logging();

    let config = AppConfig::load()?;
    tracing::info!(
        fixture = %config.fixture_path,
        strategy = %config.strategy,
        amount_x = ?config.amount_x,
        sample_radius = config.advisor.sample_radius,
        max_bins = config.advisor.max_bins_per_position,
        "[INIT] dlmm-range-advisor starting"
    );

    let fixture = FixtureSource::from_path(&config.fixture_path).await?;
    let pool = fixture.pool.clone();
    let position = fixture.position.clone();
    let reference_amount_y = fixture.reference_amount_y;
    let advisor = Advisor::new(fixture.clone(), fixture, config.advisor.clone());

    let health = advisor.price_health(&pool).await;
    let recommendation = advisor.recommend(&pool, config.strategy).await?;
    for line in &recommendation.rationale {
        tracing::info!("[RANGE] {line}");
    }

    if let Some(amount_x) = config.amount_x {
        let advice = advisor
            .paired_amount(&pool, recommendation.range(), amount_x, reference_amount_y)
            .await?;
        if let Some(warning) = &advice.quote.warning {
            tracing::warn!("[AMOUNT] {warning}");
        }
        tracing::info!(
            amount_x,
            amount_y = advice.amount_y(),
            "[AMOUNT] deposit for recommended range"
        );
    }

    if let Some(position) = position {
        let review = advisor.evaluate_position(&pool, &position, None).await;
        if review.analysis.should_rebalance {
            let record = review.record(recommendation.range());
            tracing::info!(
                record = %serde_json::to_string(&record)?,
                "[REBAL] rebalance suggested"
            );
        }
    }

    if !health.is_healthy {
        tracing::warn!(
            deviation = health.deviation,
            "[HEALTH] pool price is off the oracle; treat the range with care"
        );
    }
    Ok(())
}
