//! Platform API endpoint paths (service-provider mode).

use reqwest::Url;

/// Production API host.
pub const DEFAULT_API_BASE_URL: &str = "https://api.mch.weixin.qq.com";

pub const PARTNER_TRANSACTIONS: &str = "/v3/pay/partner/transactions";
pub const UNIFIED_ORDER_JSAPI: &str = "/v3/pay/partner/transactions/jsapi";
pub const REFUNDS: &str = "/v3/refund/domestic/refunds";
pub const TRADE_BILL: &str = "/v3/bill/tradebill";
pub const FUND_FLOW_BILL: &str = "/v3/bill/fundflowbill";

pub fn transaction_by_id(transaction_id: &str) -> String {
    format!("{}/id/{}", PARTNER_TRANSACTIONS, transaction_id)
}

pub fn transaction_by_out_trade_no(out_trade_no: &str) -> String {
    format!("{}/out-trade-no/{}", PARTNER_TRANSACTIONS, out_trade_no)
}

pub fn close_transaction(out_trade_no: &str) -> String {
    format!("{}/out-trade-no/{}/close", PARTNER_TRANSACTIONS, out_trade_no)
}

pub fn refund_by_out_refund_no(out_refund_no: &str) -> String {
    format!("{}/{}", REFUNDS, out_refund_no)
}

/// Appends url-encoded query parameters to `path`.
///
/// The result is the exact `path?query` string that gets signed and sent.
pub fn with_query<'a, I>(path: &str, params: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut url = match Url::parse(DEFAULT_API_BASE_URL).and_then(|base| base.join(path)) {
        Ok(url) => url,
        Err(_) => return path.to_string(),
    };
    {
        let mut pairs = url.query_pairs_mut();
        pairs.extend_pairs(params);
    }

    match url.query() {
        Some(query) if !query.is_empty() => format!("{}?{}", url.path(), query),
        _ => url.path().to_string(),
    }
}
