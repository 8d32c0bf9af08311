use crate::domain::cross_detector::{CrossDetector, DEFAULT_LOOKBACK};
use crate::domain::errors::CoreError;
use crate::domain::indicator::{HighLowIndicator, IndicatorConfig};
use crate::domain::period_resolver::PeriodResolver;
use crate::domain::ports::MarketDataProvider;
use crate::domain::types::{
    AssetCondition, Candle, CrossDirection, Interval, PeriodSpec, Signal, TimeZoneId,
};
use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Configuration for one correlation-crack strategy run.
#[derive(Debug, Clone)]
pub struct StrategyConfig {
    pub primary_assets: Vec<String>,
    pub period: PeriodSpec,
    pub direction: CrossDirection,
    pub use_body_high_low: bool,
    pub timezone: Option<TimeZoneId>,
    pub min_correlated_assets: usize,
    pub market_data_interval: Interval,
    pub candles_limit: usize,
    pub cross_detection_lookback: usize,
}

impl StrategyConfig {
    pub fn new(primary_assets: Vec<String>, period: PeriodSpec, direction: CrossDirection) -> Self {
        Self {
            primary_assets,
            period,
            direction,
            use_body_high_low: false,
            timezone: None,
            min_correlated_assets: 1,
            market_data_interval: Interval::FiveMin,
            candles_limit: 100,
            cross_detection_lookback: DEFAULT_LOOKBACK,
        }
    }

    /// `period.timezone` (session only) > `config.timezone` > `America/New_York`.
    pub fn effective_timezone(&self) -> TimeZoneId {
        if let PeriodSpec::Session(session) = &self.period {
            session.timezone
        } else {
            self.timezone.unwrap_or_default()
        }
    }

    fn validate(&self) -> Result<(), CoreError> {
        if !(2..=4).contains(&self.primary_assets.len()) {
            return Err(CoreError::InvalidConfig {
                reason: format!(
                    "primaryAssets must contain 2..4 symbols, got {}",
                    self.primary_assets.len()
                ),
            });
        }
        if let PeriodSpec::Session(session) = &self.period {
            crate::domain::time::validate_session_spec(session)?;
        }
        Ok(())
    }
}

/// Observable phases of a strategy run (§4.9). Not surfaced on the public
/// API beyond logging — any failure transitions directly to `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Validating,
    Fetching,
    Computing,
    Detecting,
    Deciding,
    Signalling,
    Quiet,
    Failed,
}

/// Outcome of one strategy run. Never partial: either `success` is `false`
/// with a human-readable `error`, or it carries a complete picture of every
/// primary asset's condition.
#[derive(Debug, Clone)]
pub struct StrategyResult {
    pub success: bool,
    pub error: Option<String>,
    pub signal: Option<Signal>,
    pub conditions: Vec<AssetCondition>,
    pub reference_levels: HashMap<String, Decimal>,
}

impl StrategyResult {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(message.into()),
            signal: None,
            conditions: Vec::new(),
            reference_levels: HashMap::new(),
        }
    }
}

/// Orchestrates fan-out fetch, per-asset reference levels, cross detection,
/// and the correlation-crack decision.
pub struct CorrelationCrackStrategy {
    provider: Arc<dyn MarketDataProvider>,
}

impl CorrelationCrackStrategy {
    pub fn new(provider: Arc<dyn MarketDataProvider>) -> Self {
        Self { provider }
    }

    pub async fn run(&self, config: &StrategyConfig) -> StrategyResult {
        if let Err(e) = config.validate() {
            warn!(state = ?RunState::Failed, reason = %e, "strategy config invalid");
            return StrategyResult::failure("Invalid configuration");
        }
        info!(state = ?RunState::Fetching, assets = ?config.primary_assets, "fetching candle series");

        let fetches = config.primary_assets.iter().map(|symbol| {
            let provider = Arc::clone(&self.provider);
            let symbol = symbol.clone();
            let interval = config.market_data_interval;
            let limit = config.candles_limit;
            async move {
                provider
                    .get_candles(&symbol, interval.as_str(), limit)
                    .await
                    .map_err(|e| (symbol.clone(), e.to_string()))
                    .map(|candles| (symbol, candles))
            }
        });

        let fetched: Vec<_> = futures::future::join_all(fetches).await;
        let mut candles_by_symbol: HashMap<String, Vec<Candle>> = HashMap::new();
        for result in fetched {
            match result {
                Ok((symbol, candles)) => {
                    candles_by_symbol.insert(symbol, candles);
                }
                Err((symbol, cause)) => {
                    warn!(state = ?RunState::Failed, %symbol, %cause, "candle fetch failed");
                    return StrategyResult::failure(
                        CoreError::FetchFailure { symbol, cause }.to_string(),
                    );
                }
            }
        }

        info!(state = ?RunState::Computing, "computing reference levels");
        let zone = config.effective_timezone();
        let now = Utc::now();
        let mut reference_levels: HashMap<String, Decimal> = HashMap::new();
        let mut candles_snapshot: HashMap<String, Vec<Candle>> = HashMap::new();

        for symbol in &config.primary_assets {
            let candles = candles_by_symbol.remove(symbol).unwrap_or_default();
            let indicator_config = IndicatorConfig {
                symbol: symbol.clone(),
                period: config.period.clone(),
                use_body_high_low: config.use_body_high_low,
                timezone: zone,
            };
            let high_low = match HighLowIndicator::calculate(&candles, &indicator_config, now) {
                Ok(result) => result,
                Err(e) => {
                    warn!(state = ?RunState::Failed, %symbol, cause = %e, "reference calculation failed");
                    return StrategyResult::failure(
                        CoreError::ReferenceFailure {
                            symbol: symbol.clone(),
                            cause: e.to_string(),
                        }
                        .to_string(),
                    );
                }
            };

            let reference_level = match config.direction {
                CrossDirection::CrossUnder => high_low.high,
                CrossDirection::CrossOver => high_low.low,
            };
            reference_levels.insert(symbol.clone(), reference_level);
            candles_snapshot.insert(symbol.clone(), candles);
        }

        info!(state = ?RunState::Detecting, "testing for reference crossings");
        let mut conditions = Vec::with_capacity(config.primary_assets.len());
        for symbol in &config.primary_assets {
            let candles = candles_snapshot.get(symbol).cloned().unwrap_or_default();
            let reference_level = reference_levels[symbol];
            let current_price = candles.last().map(|c| c.close).unwrap_or(Decimal::ZERO);
            let outcome = CrossDetector::detect(
                &candles,
                reference_level,
                config.direction,
                config.cross_detection_lookback,
            );
            conditions.push(AssetCondition {
                symbol: symbol.clone(),
                has_crossed: outcome.has_crossed,
                cross_direction: outcome.has_crossed.then_some(config.direction),
                current_price,
                reference_level,
                cross_time: outcome.cross_time,
            });
        }

        info!(state = ?RunState::Deciding, "evaluating correlation-crack decision");
        let (crossed, held): (Vec<_>, Vec<_>) =
            conditions.iter().cloned().partition(|c| c.has_crossed);

        let signal = if crossed.len() == 1 && held.len() >= config.min_correlated_assets {
            let trigger = &crossed[0];
            let confidence = Self::confidence(trigger, &held);
            info!(state = ?RunState::Signalling, trigger = %trigger.symbol, confidence, "correlation crack fired");
            Some(Signal {
                trigger_asset: trigger.symbol.clone(),
                direction: config.direction,
                correlated_assets: held.iter().map(|c| c.symbol.clone()).collect(),
                reference_level: trigger.reference_level,
                confidence,
                timestamp: now,
                per_asset_conditions: conditions.clone(),
            })
        } else {
            info!(state = ?RunState::Quiet, "no correlation crack this run");
            None
        };

        StrategyResult {
            success: true,
            error: None,
            signal,
            conditions,
            reference_levels,
        }
    }

    /// `c = 0.5 + (|held| − 1) · 0.1 + min(averageDistance · 2, 0.3)`, clamped to `[0,1]`.
    fn confidence(_trigger: &AssetCondition, held: &[AssetCondition]) -> f64 {
        if held.is_empty() {
            return 0.0;
        }
        let average_distance: f64 = held
            .iter()
            .map(|c| {
                if c.reference_level.is_zero() {
                    0.0
                } else {
                    ((c.current_price - c.reference_level) / c.reference_level)
                        .abs()
                        .to_f64()
                        .unwrap_or(0.0)
                }
            })
            .sum::<f64>()
            / held.len() as f64;

        let c = 0.5 + (held.len() as f64 - 1.0) * 0.1 + (average_distance * 2.0).min(0.3);
        c.clamp(0.0, 1.0)
    }
}
