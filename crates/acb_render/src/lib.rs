use std::fmt::Write as _;

use acb_core::capes::CapeFlag;
use acb_core::compact::DecodedStream;
use acb_core::compact::analysis::{StreamAnalysis, analyze};
use acb_core::compact::entry::{ElementValue, Entry, ExtendedValue, Record};
use acb_core::core_api::{PatchReport, Snapshot};
use serde_json::{Map as JsonMap, Value as JsonValue};

const LABEL_WIDTH: usize = 14;
const COUNT_WIDTH: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DecodeRenderOptions {
    /// List every decoded entry.
    pub entries: bool,
    /// Append table-ref groups, extended subtypes and array clusters.
    pub analysis: bool,
}

pub fn render_layout_text(snapshot: &Snapshot) -> String {
    let mut out = String::new();
    writeln!(out, "File size: {} bytes", snapshot.file_len).expect("writing to String cannot fail");
    writeln!(out).expect("writing to String cannot fail");
    writeln!(
        out,
        "{:<8}{:>10}{:>10}{:>10}{:>8}  {}",
        "Block", "Start", "End", "Length", "Header", "Kind"
    )
    .expect("writing to String cannot fail");
    for block in &snapshot.blocks {
        writeln!(
            out,
            "{:<8}{:>10}{:>10}{:>10}{:>8}  {}",
            block.block,
            hex(block.start),
            hex(block.end),
            block.len(),
            block.header_len,
            if block.compressed { "LZSS" } else { "raw" }
        )
        .expect("writing to String cannot fail");
    }

    writeln!(out).expect("writing to String cannot fail");
    writeln!(
        out,
        "{:<8}{:>10}{:>12}{:>10}  {}",
        "Region", "Offset", "In block 3", "Size", "Checksum"
    )
    .expect("writing to String cannot fail");
    for region in &snapshot.regions {
        writeln!(
            out,
            "{:<8}{:>10}{:>12}{:>10}  {}",
            region.index,
            hex(region.offset),
            hex(region.offset_in_block3),
            region.declared_size,
            region
                .checksum
                .map_or_else(|| "-".to_string(), |c| format!("{c:08X}"))
        )
        .expect("writing to String cannot fail");
    }

    writeln!(out).expect("writing to String cannot fail");
    let check = &snapshot.block4_checksum;
    let status = if check.is_valid() { "OK" } else { "MISMATCH" };
    writeln!(
        out,
        "Block 4 checksum: stored {} computed {:08X} [{status}]",
        check
            .stored
            .map_or_else(|| "-".to_string(), |c| format!("{c:08X}")),
        check.computed
    )
    .expect("writing to String cannot fail");
    out
}

pub fn render_layout_json(snapshot: &Snapshot) -> JsonValue {
    let mut out = JsonMap::new();
    out.insert("file_len".to_string(), JsonValue::from(snapshot.file_len));

    let blocks = snapshot
        .blocks
        .iter()
        .map(|block| {
            let mut entry = JsonMap::new();
            entry.insert("block".to_string(), JsonValue::from(block.block));
            entry.insert("compressed".to_string(), JsonValue::Bool(block.compressed));
            entry.insert("start".to_string(), JsonValue::from(block.start));
            entry.insert("end".to_string(), JsonValue::from(block.end));
            entry.insert("len".to_string(), JsonValue::from(block.len()));
            entry.insert("header_len".to_string(), JsonValue::from(block.header_len));
            entry.insert("payload_len".to_string(), JsonValue::from(block.payload_len));
            JsonValue::Object(entry)
        })
        .collect();
    out.insert("blocks".to_string(), JsonValue::Array(blocks));

    let regions = snapshot
        .regions
        .iter()
        .map(|region| {
            let mut entry = JsonMap::new();
            entry.insert("index".to_string(), JsonValue::from(region.index));
            entry.insert("offset".to_string(), JsonValue::from(region.offset));
            entry.insert(
                "offset_in_block3".to_string(),
                JsonValue::from(region.offset_in_block3),
            );
            entry.insert(
                "declared_size".to_string(),
                JsonValue::from(region.declared_size),
            );
            entry.insert(
                "checksum".to_string(),
                region.checksum.map_or(JsonValue::Null, JsonValue::from),
            );
            JsonValue::Object(entry)
        })
        .collect();
    out.insert("regions".to_string(), JsonValue::Array(regions));

    let mut checksum = JsonMap::new();
    checksum.insert(
        "stored".to_string(),
        snapshot
            .block4_checksum
            .stored
            .map_or(JsonValue::Null, JsonValue::from),
    );
    checksum.insert(
        "computed".to_string(),
        JsonValue::from(snapshot.block4_checksum.computed),
    );
    checksum.insert(
        "valid".to_string(),
        JsonValue::Bool(snapshot.block4_checksum.is_valid()),
    );
    out.insert("block4_checksum".to_string(), JsonValue::Object(checksum));

    JsonValue::Object(out)
}

pub fn render_decode_text(stream: &DecodedStream, options: DecodeRenderOptions) -> String {
    let mut out = String::new();
    let header = &stream.header;
    writeln!(
        out,
        "Header: version {:#04x}, data size {}, flags {:#010x}",
        header.version, header.data_size, header.flags
    )
    .expect("writing to String cannot fail");
    writeln!(
        out,
        "Preamble: {} bytes (data starts at {})",
        stream.preamble.len(),
        hex(stream.data_offset)
    )
    .expect("writing to String cannot fail");
    writeln!(
        out,
        "Entries: {} ({} markers, {} unclassified bytes)",
        stream.entries.len(),
        stream.stats.markers(),
        stream.unknown_byte_count
    )
    .expect("writing to String cannot fail");

    writeln!(out).expect("writing to String cannot fail");
    writeln!(out, "Record counts:").expect("writing to String cannot fail");
    for (tag, count) in stream.stats.iter() {
        writeln!(
            out,
            "  {:<width$}{count:>COUNT_WIDTH$}",
            tag.label(),
            width = LABEL_WIDTH
        )
        .expect("writing to String cannot fail");
    }

    if options.entries {
        writeln!(out).expect("writing to String cannot fail");
        writeln!(out, "Entries:").expect("writing to String cannot fail");
        for entry in &stream.entries {
            writeln!(
                out,
                "  {}  {:<width$}{}",
                hex(entry.offset),
                entry.tag().label(),
                describe_record(&entry.record),
                width = LABEL_WIDTH
            )
            .expect("writing to String cannot fail");
        }
    }

    if options.analysis {
        out.push('\n');
        out.push_str(&render_analysis_text(&analyze(stream)));
    }

    out
}

pub fn render_analysis_text(analysis: &StreamAnalysis) -> String {
    let mut out = String::new();

    writeln!(out, "Table references:").expect("writing to String cannot fail");
    for group in &analysis.table_refs {
        let properties: Vec<String> = group
            .property_ids
            .iter()
            .map(|id| format!("{id:02X}"))
            .collect();
        writeln!(
            out,
            "  {:#04x} {:<24} x{:<6} properties: {}",
            group.table_id,
            group.type_name.unwrap_or("?"),
            group.count,
            properties.join(" ")
        )
        .expect("writing to String cannot fail");
    }

    writeln!(out).expect("writing to String cannot fail");
    writeln!(out, "Extended values:").expect("writing to String cannot fail");
    for group in &analysis.extended {
        let samples: Vec<String> = group
            .samples
            .iter()
            .map(|sample| format!("{} @{}", extended_value(&sample.value), hex(sample.offset)))
            .collect();
        writeln!(
            out,
            "  subtype {:#04x} x{:<6} {}",
            group.subtype,
            group.count,
            samples.join(", ")
        )
        .expect("writing to String cannot fail");
    }

    writeln!(out).expect("writing to String cannot fail");
    writeln!(out, "Array clusters:").expect("writing to String cannot fail");
    for cluster in &analysis.clusters {
        let types: Vec<String> = cluster
            .element_types
            .iter()
            .map(|(ty, n)| format!("{ty:02X}x{n}"))
            .collect();
        writeln!(
            out,
            "  {}..{}  {} elements  types: {}",
            hex(cluster.start),
            hex(cluster.last_offset),
            cluster.count,
            types.join(" ")
        )
        .expect("writing to String cannot fail");
    }

    out
}

pub fn render_decode_json(
    stream: &DecodedStream,
    options: DecodeRenderOptions,
) -> serde_json::Result<JsonValue> {
    let mut out = JsonMap::new();
    out.insert("header".to_string(), serde_json::to_value(stream.header)?);
    out.insert(
        "preamble_len".to_string(),
        JsonValue::from(stream.preamble.len()),
    );
    out.insert(
        "data_offset".to_string(),
        JsonValue::from(stream.data_offset),
    );
    out.insert(
        "entry_count".to_string(),
        JsonValue::from(stream.entries.len()),
    );
    out.insert(
        "unclassified".to_string(),
        JsonValue::from(stream.unknown_byte_count),
    );

    let mut counts = JsonMap::new();
    for (tag, count) in stream.stats.iter() {
        counts.insert(tag.label().to_string(), JsonValue::from(count));
    }
    out.insert("counts".to_string(), JsonValue::Object(counts));

    if options.entries {
        let entries = stream
            .entries
            .iter()
            .map(entry_json)
            .collect::<serde_json::Result<Vec<_>>>()?;
        out.insert("entries".to_string(), JsonValue::Array(entries));
    }
    if options.analysis {
        out.insert("analysis".to_string(), serde_json::to_value(analyze(stream))?);
    }

    Ok(JsonValue::Object(out))
}

fn entry_json(entry: &Entry) -> serde_json::Result<JsonValue> {
    let mut value = serde_json::to_value(entry)?;
    if let (JsonValue::Object(map), Some(ty)) = (&mut value, entry.record.resolved_type()) {
        map.insert(
            "type_name".to_string(),
            JsonValue::String(ty.type_name.to_string()),
        );
    }
    Ok(value)
}

pub fn render_patch_text(report: &PatchReport) -> String {
    let mut out = String::new();

    if !report.capes.is_empty() {
        for cape in &report.capes {
            writeln!(out, "{}", cape_line(cape)).expect("writing to String cannot fail");
        }
        if report.already_applied {
            writeln!(out, "Capes already unlocked; file left unchanged.")
                .expect("writing to String cannot fail");
        }
    } else {
        for applied in &report.edits {
            writeln!(
                out,
                "Block {} {}: {:02X} -> {:02X}{}",
                applied.edit.block.number(),
                hex(applied.edit.offset),
                applied.previous,
                applied.edit.value,
                if applied.changed() { "" } else { " (unchanged)" }
            )
            .expect("writing to String cannot fail");
        }
        if report.already_applied {
            writeln!(out, "All edits already applied; file left unchanged.")
                .expect("writing to String cannot fail");
        }
    }

    if report.already_applied {
        return out;
    }

    for resize in &report.recompressed {
        writeln!(
            out,
            "Block {} recompressed: {} -> {} bytes",
            resize.block.number(),
            resize.old_len,
            resize.new_len
        )
        .expect("writing to String cannot fail");
    }
    if let Some(size) = report.region4_size {
        writeln!(out, "Region 4 size: {} -> {}", size.old, size.new)
            .expect("writing to String cannot fail");
    }
    if let Some(checksum) = report.region4_checksum {
        writeln!(
            out,
            "Region 4 checksum: {:08X} -> {:08X}",
            checksum.old, checksum.new
        )
        .expect("writing to String cannot fail");
    }
    for block in &report.rebuilt_headers {
        writeln!(out, "Block {block} header rebuilt").expect("writing to String cannot fail");
    }
    writeln!(
        out,
        "Output: {} bytes (input {} bytes)",
        report.output_len, report.input_len
    )
    .expect("writing to String cannot fail");
    out
}

pub fn render_patch_json(report: &PatchReport) -> serde_json::Result<JsonValue> {
    serde_json::to_value(report)
}

pub fn cape_line(cape: &CapeFlag) -> String {
    format!(
        "Cape {} ({:#06X}): {:02X} -> {:02X}",
        cape.index, cape.offset, cape.previous, cape.value
    )
}

pub fn describe_record(record: &Record) -> String {
    match record {
        Record::TableRef {
            table_id,
            property_id,
        } => {
            let name = record.resolved_type().map_or("?", |t| t.type_name);
            format!("table {table_id:#04x} ({name}) property {property_id:#04x}")
        }
        Record::Extended { subtype, value } => {
            format!("subtype {subtype:#04x} {}", extended_value(value))
        }
        Record::ArrayElement {
            element_type,
            value,
        } => {
            let value = match value {
                ElementValue::Byte(v) => format!("{v:#04x}"),
                ElementValue::Word(v) => format!("{v:#06x}"),
                ElementValue::Dword(v) => format!("{v:#010x}"),
            };
            format!("type {element_type:#04x} {value}")
        }
        Record::Fixed { value, .. } => format!("{value:#010x} ({value})"),
        Record::Varint { value, width } => format!("{value} ({width} bytes)"),
        Record::TypeRef { table_id, extra } => {
            format!("table {table_id:#04x} extra {extra:#04x}")
        }
        Record::Opaque { value, .. } => format!("{value:#06x}"),
        Record::Marker { marker } => match marker.as_bool() {
            Some(flag) => flag.to_string(),
            None => "separator".to_string(),
        },
    }
}

fn extended_value(value: &ExtendedValue) -> String {
    match value {
        ExtendedValue::Byte(v) => format!("{v:#04x}"),
        ExtendedValue::Word(v) => format!("{v:#06x}"),
        ExtendedValue::Reference(bytes) => {
            let hex: Vec<String> = bytes.iter().map(|b| format!("{b:02X}")).collect();
            format!("[{}]", hex.join(" "))
        }
    }
}

fn hex(offset: usize) -> String {
    format!("0x{offset:06X}")
}
