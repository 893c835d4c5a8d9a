pub mod common;

use std::fs;

use datafile::{
    DataFileError,
    core::{number::NumberFormat, row::Row},
    file::{
        DataFile, encoding_for_label,
        reader::{DataFileReader, DataFileReaderBuilder},
        writer::{DataFileWriter, DataFileWriterBuilder},
    },
};
use rand::distr::{Alphanumeric, SampleString};
use tempfile::NamedTempFile;

use common::{init_logger, temp_path};

fn english_reader() -> DataFileReaderBuilder {
    DataFileReaderBuilder::new().number_format(NumberFormat::english())
}

fn english_writer() -> DataFileWriterBuilder {
    DataFileWriterBuilder::new().number_format(NumberFormat::english())
}

/// Cells that need every kind of CSV escaping, all starting with a letter.
fn random_cell(i: usize) -> String {
    let head = Alphanumeric.sample_string(&mut rand::rng(), 1 + i % 7);
    let tail = Alphanumeric.sample_string(&mut rand::rng(), i % 5);
    let special = ["", ",", "\"", "\n", " ", "\"\"", ", \"x\"\n"][i % 7];
    format!("{head}{special}{tail}")
}

#[test]
fn header_round_trip_through_file() {
    init_logger();
    let file = NamedTempFile::new().expect("Unable to create a temp file");
    let path = file.path();

    let mut writer = english_writer()
        .headers(["col 1", "col 2", "abc"])
        .from_path(path)
        .expect("Unable to create the CSV file");
    let row = writer.next_row().unwrap();
    row.add_int(1);
    row.add_int(2);
    row.add_int(3);
    writer.close().unwrap();

    let mut reader = english_reader()
        .has_headers(true)
        .from_path(path)
        .expect("Unable to open the CSV file");

    assert_eq!(reader.header_list(), ["col 1", "col 2", "abc"]);
    let row = reader.next_row().unwrap().unwrap();
    assert_eq!(row.get_int_by_name("abc").unwrap(), 3);
    assert_eq!(row.get_int_by_name("col 1").unwrap(), 1);
    assert!(reader.next_row().unwrap().is_none());
    reader.close().unwrap();
}

#[test]
fn close_writes_the_last_row_exactly_once() {
    let path = temp_path("csv");

    let mut writer = english_writer().from_path(&path).unwrap();
    let row = writer.next_row().unwrap();
    row.add("last");
    row.add_double(0.5);
    writer.close().unwrap();
    writer.close().unwrap();

    let file_content = fs::read_to_string(&path).expect("Should have been able to read the file");
    assert_eq!(file_content, "last,0.5\n");

    fs::remove_file(path).unwrap();
}

#[test]
fn multi_line_cells_survive_a_file_round_trip() {
    let path = temp_path("csv");
    let rows: Vec<Row> = vec![
        ["1", "first\nsecond", ""].into_iter().collect(),
        ["2", "say \"hi\"", "  indented"].into_iter().collect(),
        ["3", "a,b,c", "\n"].into_iter().collect(),
    ];

    let mut writer = english_writer().headers(["id", "text", "note"]).from_path(&path).unwrap();
    for source in &rows {
        let row = writer.next_row().unwrap();
        for cell in source.iter() {
            row.add(cell);
        }
    }
    writer.close().unwrap();

    let mut reader = english_reader().has_headers(true).from_path(&path).unwrap();
    let read: Vec<Row> = reader.rows().collect::<Result<_, _>>().unwrap();

    assert_eq!(read, rows);
    assert_eq!(read[0].get_by_name("text"), "first\nsecond");
    assert_eq!(read[2].get_by_name("note"), "\n");
    assert_eq!(reader.line_number(), 6);

    fs::remove_file(path).unwrap();
}

#[test]
fn written_csv_is_read_back_by_the_csv_crate() {
    let mut writer = english_writer().from_writer(Vec::new()).unwrap();
    let mut expected = Vec::new();

    for i in 0..50 {
        let cells: Vec<String> = (0..3).map(|column| random_cell(i * 3 + column)).collect();
        let row = writer.next_row().unwrap();
        for cell in &cells {
            row.add(cell.as_str());
        }
        expected.push(cells);
    }
    let output = writer.finish().unwrap();

    let mut oracle = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_reader(output.as_slice());
    let parsed: Vec<Vec<String>> = oracle
        .records()
        .map(|record| record.unwrap().iter().map(str::to_owned).collect())
        .collect();

    assert_eq!(parsed, expected);
}

#[test]
fn csv_crate_output_is_read_back() {
    let mut expected = Vec::new();
    let mut oracle = csv::WriterBuilder::new()
        .terminator(csv::Terminator::CRLF)
        .from_writer(Vec::new());

    for i in 0..50 {
        let cells: Vec<String> = (0..4).map(|column| random_cell(i * 4 + column)).collect();
        oracle.write_record(&cells).unwrap();
        expected.push(cells);
    }
    let data = oracle.into_inner().unwrap();

    let mut reader = english_reader().from_reader(data.as_slice()).unwrap();
    let parsed: Vec<Vec<String>> = reader
        .rows()
        .map(|row| row.unwrap().iter().map(str::to_owned).collect())
        .collect();

    assert_eq!(parsed, expected);
}

#[test]
fn trailing_empty_cell_and_blank_lines() {
    let mut reader = english_reader()
        .from_reader("Feld 1,,Feld 3,\n\n\"\",x\n".as_bytes())
        .unwrap();

    let row = reader.next_row().unwrap().unwrap();
    assert_eq!(row.iter().collect::<Vec<_>>(), vec!["Feld 1", "", "Feld 3", ""]);

    let row = reader.next_row().unwrap().unwrap();
    assert!(row.is_empty());

    let row = reader.next_row().unwrap().unwrap();
    assert_eq!(row.iter().collect::<Vec<_>>(), vec!["", "x"]);
}

#[test]
fn append_adds_rows_after_existing_content() {
    let path = temp_path("csv");

    for value in ["a", "b"] {
        let mut writer = english_writer().append(true).from_path(&path).unwrap();
        writer.next_row().unwrap().add(value);
        writer.close().unwrap();
    }

    assert_eq!(fs::read_to_string(&path).unwrap(), "a\nb\n");

    let mut writer = english_writer().from_path(&path).unwrap();
    writer.next_row().unwrap().add("c");
    writer.close().unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), "c\n");

    fs::remove_file(path).unwrap();
}

#[test]
fn one_writer_reopened_on_two_files() {
    let first = temp_path("csv");
    let second = temp_path("csv");

    let mut writer: DataFileWriter = english_writer().has_headers(true).build();
    for (path, header) in [(&first, "left"), (&second, "right")] {
        writer.open_path(path).unwrap();
        writer.next_row().unwrap().add(header);
        writer.next_row().unwrap().add_int(1);
        writer.close().unwrap();
    }

    assert_eq!(fs::read_to_string(&first).unwrap(), "left\n1\n");
    assert_eq!(fs::read_to_string(&second).unwrap(), "right\n1\n");

    let mut reader: DataFileReader = english_reader().has_headers(true).build();
    for (path, header) in [(&first, "left"), (&second, "right")] {
        reader.open_path(path).unwrap();
        assert_eq!(reader.header_list(), [header]);
        assert_eq!(reader.next_row().unwrap().unwrap().get_int_by_name(header).unwrap(), 1);
        reader.close().unwrap();
    }

    fs::remove_file(first).unwrap();
    fs::remove_file(second).unwrap();
}

#[test]
fn legacy_encoding_round_trip() {
    let path = temp_path("csv");
    let latin2 = encoding_for_label("iso-8859-2").unwrap();

    let mut writer = english_writer()
        .encoding(latin2)
        .headers(["město", "počet"])
        .from_path(&path)
        .unwrap();
    let row = writer.next_row().unwrap();
    row.add("Ústí nad Labem");
    row.add_int(92_716);
    writer.close().unwrap();

    let bytes = fs::read(&path).unwrap();
    assert!(bytes.iter().all(|byte| *byte != 0xc3 && *byte != 0xc5));

    let mut reader = english_reader()
        .encoding(latin2)
        .has_headers(true)
        .from_path(&path)
        .unwrap();
    let row = reader.next_row().unwrap().unwrap();
    assert_eq!(row.get_by_name("město"), "Ústí nad Labem");
    assert_eq!(row.get_int_by_name("počet").unwrap(), 92_716);

    fs::remove_file(path).unwrap();
}

#[test]
fn closing_clears_the_header_of_rows_already_read() {
    let mut reader = english_reader()
        .has_headers(true)
        .from_reader("name,age\nAda,36\n".as_bytes())
        .unwrap();
    let row = reader.next_row().unwrap().unwrap().clone();
    reader.close().unwrap();

    assert_eq!(row.get_by_name("name"), "");
    assert!(matches!(
        row.get_int_by_name("age"),
        Err(DataFileError::NumberFormat(_))
    ));
    assert_eq!(row.get_int_by_name_or("age", -1), -1);
    assert_eq!(row.get(0), "Ada");
    assert_eq!(row.to_string(), "[Row]|'Ada'|'36'");
}
