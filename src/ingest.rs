//! Playlist export ingestion (Exportify CSV layout).
//!
//! Columns are addressed by position, so the header is checked up front and
//! the whole file is read before any network call is made.

use std::io::Read;
use std::path::Path;

use crate::error::IngestError;
use crate::models::SourceRecord;

/// Where the export tool that produces this layout lives, for error messages
pub const EXPORT_TOOL_URL: &str = "https://watsonbox.github.io/exportify/";

pub const TITLE_COLUMN: usize = 1;
pub const ARTIST_COLUMN: usize = 3;
pub const ALBUM_COLUMN: usize = 5;
pub const ALBUM_ARTIST_COLUMN: usize = 7;
pub const ISRC_COLUMN: usize = 16;

/// Position and header name of every column the reader consumes
const EXPECTED_COLUMNS: [(usize, &str); 5] = [
    (TITLE_COLUMN, "Track Name"),
    (ARTIST_COLUMN, "Artist Name(s)"),
    (ALBUM_COLUMN, "Album Name"),
    (ALBUM_ARTIST_COLUMN, "Album Artist Name(s)"),
    (ISRC_COLUMN, "ISRC"),
];

const MIN_COLUMNS: usize = ISRC_COLUMN + 1;

/// Read every record of the CSV at `path`.
pub fn read_records(path: &Path) -> Result<Vec<SourceRecord>, IngestError> {
    let file = std::fs::File::open(path)?;
    read_records_from(file)
}

/// Read every record from an in-memory or streamed CSV.
pub fn read_records_from<R: Read>(reader: R) -> Result<Vec<SourceRecord>, IngestError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    for (index, expected) in EXPECTED_COLUMNS {
        let found = headers.get(index).unwrap_or("");
        if found != expected {
            return Err(IngestError::MalformedLayout {
                index,
                expected,
                found: found.to_string(),
            });
        }
    }

    let mut records = Vec::new();
    for (i, row) in rdr.records().enumerate() {
        let row = row?;
        if row.len() < MIN_COLUMNS {
            return Err(IngestError::MissingColumns {
                row: i + 1,
                found: row.len(),
                expected: MIN_COLUMNS,
            });
        }
        let field = |index: usize| row.get(index).unwrap_or("").to_string();
        records.push(SourceRecord {
            title: field(TITLE_COLUMN),
            artist: field(ARTIST_COLUMN),
            album: field(ALBUM_COLUMN),
            album_artist: field(ALBUM_ARTIST_COLUMN),
            isrc: field(ISRC_COLUMN),
        });
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const HEADER: &str = "Track URI,Track Name,Artist URI(s),Artist Name(s),Album URI,Album Name,\
Album Artist URI(s),Album Artist Name(s),Album Release Date,Album Image URL,Disc Number,\
Track Number,Track Duration (ms),Track Preview URL,Explicit,Popularity,ISRC,Added By,Added At";

    fn row(title: &str, artist: &str, album: &str, album_artist: &str, isrc: &str) -> String {
        format!(
            "spotify:track:x,{},spotify:artist:y,{},spotify:album:z,{},spotify:artist:y,{},\
2001-01-01,,1,1,200000,,false,50,{},user,2024-01-01",
            title, artist, album, album_artist, isrc
        )
    }

    #[test]
    fn test_reads_expected_columns() {
        let csv = format!(
            "{}\n{}\n{}\n",
            HEADER,
            row("Song", "Band", "Album", "Band", "USABC1234567"),
            row("\"Other, Song\"", "Singer", "Record", "Various Artists", "")
        );
        let records = read_records_from(csv.as_bytes()).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(
            records[0],
            SourceRecord {
                title: "Song".to_string(),
                artist: "Band".to_string(),
                album: "Album".to_string(),
                album_artist: "Band".to_string(),
                isrc: "USABC1234567".to_string(),
            }
        );
        assert_eq!(records[1].title, "Other, Song");
        assert_eq!(records[1].album_artist, "Various Artists");
        assert_eq!(records[1].isrc, "");
    }

    #[test]
    fn test_rejects_wrong_layout() {
        let csv = "Title,Artist,Album\nSong,Band,Album\n";
        let err = read_records_from(csv.as_bytes()).unwrap_err();
        match err {
            IngestError::MalformedLayout {
                index, expected, ..
            } => {
                assert_eq!(index, TITLE_COLUMN);
                assert_eq!(expected, "Track Name");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_rejects_missing_album_artist_column() {
        let header = HEADER.replace("Album Artist Name(s)", "Album Artists");
        let err = read_records_from(format!("{}\n", header).as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            IngestError::MalformedLayout {
                index: ALBUM_ARTIST_COLUMN,
                ..
            }
        ));
    }

    #[test]
    fn test_short_row_is_rejected() {
        let csv = format!("{}\nspotify:track:x,Song,y,Band\n", HEADER);
        let err = read_records_from(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, IngestError::MissingColumns { row: 1, found: 4, .. }));
    }

    #[test]
    fn test_header_only_file_is_empty() {
        let records = read_records_from(format!("{}\n", HEADER).as_bytes()).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_read_records_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{}", HEADER).unwrap();
        writeln!(file, "{}", row("Song", "Band", "Album", "Band", "")).unwrap();

        let records = read_records(file.path()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].artist, "Band");
    }
}
