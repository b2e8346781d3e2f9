//! Display and printing utilities

use tracing::info;

use crate::pool::PoolOverview;
use crate::types::{ArbitrageOpportunity, BotStatus, ExecutedTrade};

pub fn print_bot_status(status: &BotStatus) {
    info!("\n📊 ARBITRAGE BOT STATUS");
    info!("   Status: {}", if status.running { "running" } else { "stopped" });
    info!("   Scans completed: {}", status.scan_count);
    info!("   Last scan: {:?}", status.last_scan);
    info!("   Last opportunity: {:?}", status.last_opportunity);
    info!("   Active opportunities: {}", status.active_opportunities);

    info!("   📈 PERFORMANCE:");
    info!("     Total trades: {}", status.performance.total_trades);
    info!("     Completed: {}", status.performance.completed_trades);
    info!("     Pending: {}", status.performance.pending_trades);
    info!("     Total profit: ${:.2}", status.performance.total_profit);
    info!("     Daily profit: ${:.2}", status.performance.daily_profit);
    info!("     Daily loss: ${:.2}", status.performance.daily_loss);
    info!("     Win rate: {:.1}%", status.performance.win_rate_pct);

    info!("   📅 TODAY ({}):", status.daily.date);
    info!("     Trades: {}", status.daily.total_trades);
    info!("     Winning: {}", status.daily.winning_trades);
    info!("     Total profit: ${:.2}", status.daily.total_profit);
    info!("     Best: ${:.2} / Worst: ${:.2}", status.daily.best_trade, status.daily.worst_trade);
    info!("");
}

pub fn print_opportunity(opp: &ArbitrageOpportunity) {
    info!("🎯 {} | Buy {} @ ${:.4} | Sell {} @ ${:.4} | Spread: {:.3}%",
        opp.symbol,
        opp.buy_exchange,
        opp.buy_price,
        opp.sell_exchange,
        opp.sell_price,
        opp.profit_percentage
    );
}

pub fn print_pool_overview(overview: &PoolOverview) {
    info!("\n🏦 POOL SUMMARY");
    info!("   Pool: {}", overview.pool.pool_name);
    info!("   Members: {}/{} active", overview.pool.active_members, overview.pool.total_members);
    info!("   Total capital: ${:.2}", overview.pool.total_capital);
    info!("   Pool balance: ${:.2}", overview.pool.pool_balance);
    info!("   ROI: {:.2}%", overview.pool.roi_percentage);
    info!("   Insurance reserve: ${:.2}", overview.insurance.reserve_balance);
    info!("   Claims paid: ${:.2}", overview.insurance.total_paid);
    info!("   Validators active: {}", overview.validators.active_validators);
    info!("   Trades approved/pending: {}/{}",
        overview.validators.approved_trades,
        overview.validators.pending_trades
    );
    info!("   Strategies enabled: {}", overview.strategies.enabled_strategies);
    info!("   Profit distributed: ${:.2}", overview.total_profit_distributed);
    info!("   Trades settled: {}", overview.total_trades_settled);
    info!("");
}

pub fn print_trade(trade: &ExecutedTrade) {
    info!("✅ TRADE {} | {} | {} -> {} | amount {:.6} | fees ${:.4} | net ${:.4} [{}]",
        trade.id,
        trade.symbol,
        trade.buy_exchange,
        trade.sell_exchange,
        trade.amount,
        trade.fees_paid,
        trade.final_profit,
        trade.status
    );
}
