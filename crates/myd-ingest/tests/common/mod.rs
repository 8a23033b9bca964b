use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use zip::CompressionMethod;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

pub fn write_text(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("write fixture");
    path
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn column_letter(index: usize) -> char {
    (b'A' + u8::try_from(index).expect("small column index")) as char
}

/// Writes a minimal XLSX workbook. Numeric cells are stored as numbers,
/// everything else goes through the shared string table; empty cells are
/// left out of the sheet XML.
pub fn write_xlsx(dir: &Path, name: &str, sheets: &[(&str, Vec<Vec<&str>>)]) -> PathBuf {
    let path = dir.join(name);
    let mut zip = ZipWriter::new(File::create(&path).expect("create xlsx"));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    let mut put = |part: &str, body: String| {
        zip.start_file(part, options).expect("start part");
        zip.write_all(body.as_bytes()).expect("write part");
    };

    let mut shared: Vec<String> = Vec::new();
    let mut sheet_xml = Vec::new();
    for (_, rows) in sheets {
        let mut xml = String::from(
            r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#,
        );
        for (row_index, row) in rows.iter().enumerate() {
            let number = row_index + 1;
            xml.push_str(&format!(r#"<row r="{number}">"#));
            for (col_index, value) in row.iter().enumerate() {
                if value.is_empty() {
                    continue;
                }
                let reference = format!("{}{number}", column_letter(col_index));
                if value.parse::<f64>().is_ok() {
                    xml.push_str(&format!(r#"<c r="{reference}"><v>{value}</v></c>"#));
                } else {
                    shared.push(escape(value));
                    let index = shared.len() - 1;
                    xml.push_str(&format!(r#"<c r="{reference}" t="s"><v>{index}</v></c>"#));
                }
            }
            xml.push_str("</row>");
        }
        xml.push_str("</sheetData></worksheet>");
        sheet_xml.push(xml);
    }

    let mut workbook = String::from(
        r#"<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets>"#,
    );
    let mut rels = String::from(
        r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );
    for (position, (sheet_name, _)) in sheets.iter().enumerate() {
        let id = position + 1;
        workbook.push_str(&format!(
            r#"<sheet name="{}" sheetId="{id}" r:id="rId{id}"/>"#,
            escape(sheet_name)
        ));
        rels.push_str(&format!(
            r#"<Relationship Id="rId{id}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{id}.xml"/>"#
        ));
    }
    workbook.push_str("</sheets></workbook>");
    rels.push_str("</Relationships>");

    let strings: String = shared.iter().map(|s| format!("<si><t>{s}</t></si>")).collect();
    put(
        "[Content_Types].xml",
        r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"/>"#
            .to_string(),
    );
    put("xl/workbook.xml", workbook);
    put("xl/_rels/workbook.xml.rels", rels);
    put(
        "xl/sharedStrings.xml",
        format!(
            r#"<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">{strings}</sst>"#
        ),
    );
    for (position, xml) in sheet_xml.into_iter().enumerate() {
        put(&format!("xl/worksheets/sheet{}.xml", position + 1), xml);
    }
    drop(put);
    zip.finish().expect("finish xlsx");
    path
}
