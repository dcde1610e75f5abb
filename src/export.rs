//! Spreadsheet-friendly CSV export of the screening table.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use anyhow::Context;

use crate::types::SecurityRecord;

/// Byte-order mark so spreadsheet apps pick UTF-8 for the Korean header.
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

pub const HEADER: [&str; 19] = [
    "티커",
    "종목명",
    "산업",
    "최고가",
    "최고가 이후 최저가",
    "현재가",
    "조정 비율",
    "종가/최고가 비율",
    "최고가 경과일",
    "이격도 하위 백분위수",
    "20일 이격도",
    "50일 이격도",
    "20/50일 이격도",
    "EPS Q0",
    "EPS Q1",
    "EPS Q2",
    "EPS Q3",
    "PER",
    "ROE",
];

fn num(v: Option<f64>) -> String {
    match v {
        Some(x) if !x.is_nan() => x.to_string(),
        _ => String::new(),
    }
}

fn row(r: &SecurityRecord) -> Vec<String> {
    vec![
        r.ticker.clone(),
        r.name.clone(),
        r.industry.clone(),
        num(r.ath),
        num(r.lowest_after_ath),
        num(r.price),
        num(r.correction_ratio),
        num(r.price_to_ath),
        r.days_since_ath.map(|d| d.to_string()).unwrap_or_default(),
        num(r.spread_percentile()),
        num(r.ma20_spread),
        num(r.ma50_spread),
        num(r.ma20_50_spread),
        num(r.eps_q0),
        num(r.eps_q1),
        num(r.eps_q2),
        num(r.eps_q3),
        num(r.per),
        num(r.roe),
    ]
}

/// Write rows in the order given (usually the table's current order).
pub fn export_csv<W: Write>(records: &[SecurityRecord], mut out: W) -> anyhow::Result<()> {
    out.write_all(UTF8_BOM)?;
    let mut w = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Necessary)
        .from_writer(out);
    w.write_record(HEADER)?;
    for r in records {
        w.write_record(row(r))?;
    }
    w.flush()?;
    Ok(())
}

pub fn export_to_path(records: &[SecurityRecord], path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    export_csv(records, file)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bom_header_and_raw_numbers() {
        let r = SecurityRecord {
            price: Some(189.5),
            correction_ratio: Some(0.123),
            days_since_ath: Some(41),
            ma_spread_percentile: Some(-1.0),
            ..SecurityRecord::new("AAPL", "Apple")
        };
        let mut buf = Vec::new();
        export_csv(&[r], &mut buf).unwrap();
        assert!(buf.starts_with(UTF8_BOM));
        let text = String::from_utf8(buf[3..].to_vec()).unwrap();
        let mut lines = text.lines();
        assert!(lines.next().unwrap().starts_with("티커,종목명,산업,최고가"));
        assert_eq!(lines.next().unwrap(), "AAPL,Apple,,,,189.5,0.123,,41,,,,,,,,,,");
    }

    #[test]
    fn embedded_quotes_are_doubled() {
        let r = SecurityRecord::new("BRK-B", r#"Berkshire "B""#);
        let mut buf = Vec::new();
        export_csv(&[r], &mut buf).unwrap();
        let text = String::from_utf8(buf[3..].to_vec()).unwrap();
        assert!(text.contains(r#"BRK-B,"Berkshire ""B""","#));
    }
}
