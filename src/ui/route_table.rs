//! Plain-text tables for ranked routes and market listings.

use crate::domain::{CommodityOffer, SearchProgress, TradeRoute};

pub const ROUTE_COLUMNS: [&str; 14] = [
    "#",
    "Departure",
    "Destination",
    "Commodity",
    "Buy SCU",
    "Buy Price",
    "Sell Price",
    "Investment",
    "Unit Margin",
    "Total Margin",
    "Departure SCU Available",
    "Arrival Demand SCU",
    "Profit Margin",
    "Max Container",
];

pub fn route_row(rank: usize, route: &TradeRoute) -> Vec<String> {
    vec![
        rank.to_string(),
        route.departure_terminal_name.clone(),
        route.arrival_terminal_name.clone(),
        route.commodity_name.clone(),
        route.quantity_label(),
        route.buy_price_label(),
        route.sell_price_label(),
        route.investment_label(),
        route.unit_margin_label(),
        route.total_margin_label(),
        route.departure_stock_label(),
        route.arrival_demand_label(),
        route.profit_label(),
        route
            .arrival_max_container_size
            .map(|mcs| format!("{mcs} SCU"))
            .unwrap_or_else(|| "-".to_string()),
    ]
}

/// Ranked routes, numbered from 1 in the order given.
pub fn render_routes(routes: &[TradeRoute]) -> String {
    if routes.is_empty() {
        return "No trade routes found.\n".to_string();
    }
    let rows: Vec<Vec<String>> = routes
        .iter()
        .enumerate()
        .map(|(index, route)| route_row(index + 1, route))
        .collect();
    render_table(&ROUTE_COLUMNS, &rows)
}

pub const PRICE_COLUMNS: [&str; 6] = ["Id", "Commodity", "Buy", "Stock SCU", "Sell", "Demand SCU"];

/// Commodities traded at one terminal, sorted by name.
pub fn render_offers(offers: &[CommodityOffer]) -> String {
    if offers.is_empty() {
        return "No commodities traded here.\n".to_string();
    }
    let mut offers: Vec<&CommodityOffer> = offers.iter().collect();
    offers.sort_by(|a, b| a.commodity_name.cmp(&b.commodity_name));

    let price = |price: Option<f64>| match price {
        Some(price) if price > 0.0 => format!("{price:.2} UEC"),
        _ => "-".to_string(),
    };
    let rows: Vec<Vec<String>> = offers
        .into_iter()
        .map(|offer| {
            vec![
                offer.commodity_id.to_string(),
                offer.commodity_name.clone(),
                price(offer.buy_price),
                if offer.is_buyable() { offer.buy_stock_scu.to_string() } else { "-".to_string() },
                price(offer.sell_price),
                if offer.is_sellable() {
                    offer.available_demand_scu().to_string()
                } else {
                    "-".to_string()
                },
            ]
        })
        .collect();
    render_table(&PRICE_COLUMNS, &rows)
}

pub fn progress_line(progress: &SearchProgress) -> String {
    format!(
        "[{}/{}] {} candidates evaluated, {} routes kept",
        progress.units_done,
        progress.units_total,
        progress.candidates_evaluated,
        progress.routes_accepted
    )
}

/// Left-aligned text columns separated by two spaces, header underlined.
pub fn render_table<S: AsRef<str>>(headers: &[S], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers
        .iter()
        .map(|header| header.as_ref().chars().count())
        .collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    push_line(&mut out, headers.iter().map(|header| header.as_ref()), &widths);
    let rule: Vec<String> = widths.iter().map(|width| "-".repeat(*width)).collect();
    push_line(&mut out, rule.iter().map(String::as_str), &widths);
    for row in rows {
        push_line(&mut out, row.iter().map(String::as_str), &widths);
    }
    out
}

fn push_line<'a>(out: &mut String, cells: impl Iterator<Item = &'a str>, widths: &[usize]) {
    let line: Vec<String> = cells
        .zip(widths)
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect();
    out.push_str(line.join("  ").trim_end());
    out.push('\n');
}
