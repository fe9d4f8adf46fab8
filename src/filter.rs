use crate::schema::NormalizedLine;

const INTERNATIONAL_LINE_MARKER: &str = "VENTA INTERNACIONAL";
const INTERNATIONAL_CHANNEL_MARKERS: [&str; 2] = ["VENTA INTERNACIONAL", "INTERNACIONAL"];

/// True for export/international lines, which never count toward national sales.
pub fn is_excluded(line: &NormalizedLine) -> bool {
    let by_line = line
        .commercial_line
        .as_deref()
        .is_some_and(|name| name.to_uppercase().contains(INTERNATIONAL_LINE_MARKER));

    let by_channel = line.sales_channel.as_deref().is_some_and(|channel| {
        let channel = channel.to_uppercase();
        INTERNATIONAL_CHANNEL_MARKERS
            .iter()
            .any(|marker| channel.contains(marker))
    });

    by_line || by_channel
}

/// Splits a stream into the lines that count and the number that were excluded.
pub fn partition_excluded(lines: Vec<NormalizedLine>) -> (Vec<NormalizedLine>, usize) {
    let total = lines.len();
    let kept: Vec<NormalizedLine> = lines.into_iter().filter(|l| !is_excluded(l)).collect();
    let excluded = total - kept.len();
    (kept, excluded)
}
