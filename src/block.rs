use crate::{CounterMap, StatsError, parse_counter_line};
use log::{debug, trace};
use std::{
    fs::File,
    io::{BufRead, BufReader, Read},
    path::Path,
};

/// Delimiters written by the simulator around every statistics dump
#[derive(Debug, Clone)]
pub struct BlockMarkers {
    pub begin: String,
    pub end: String,
}

impl Default for BlockMarkers {
    fn default() -> Self {
        Self {
            begin: "Begin Simulation Statistics".to_string(),
            end: "End Simulation Statistics".to_string(),
        }
    }
}

/// One measurement interval of a statistics log
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Block {
    /// position in arrival order, counting only non-empty blocks
    pub index: usize,
    pub counters: CounterMap,
}

/// Splits a stream of lines into blocks.
///
/// A begin marker flushes the pending block and starts a new one, an end
/// marker flushes the pending block. Marker lines themselves are never parsed
/// as counters. Blocks that end up without a single counter are dropped, so a
/// log without markers yields exactly one block.
pub struct BlockSegmenter<'a> {
    markers: &'a BlockMarkers,
    current: CounterMap,
    blocks: Vec<Block>,
}

impl<'a> BlockSegmenter<'a> {
    pub fn new(markers: &'a BlockMarkers) -> Self {
        Self {
            markers,
            current: CounterMap::new(),
            blocks: vec![],
        }
    }

    pub fn push_line(&mut self, line: &str) {
        if line.contains(&self.markers.begin) || line.contains(&self.markers.end) {
            self.flush();
            return;
        }
        match parse_counter_line(line) {
            Some((name, value)) => {
                self.current.insert(name.to_string(), value);
            }
            None => trace!("not a counter: {:?}", line.trim_end()),
        }
    }

    fn flush(&mut self) {
        if self.current.is_empty() {
            return;
        }
        let counters = std::mem::take(&mut self.current);
        self.blocks.push(Block {
            index: self.blocks.len(),
            counters,
        });
    }

    pub fn finish(mut self) -> Vec<Block> {
        self.flush();
        self.blocks
    }
}

/// Segment in-memory log text
pub fn parse_blocks_str(text: &str, markers: &BlockMarkers) -> Vec<Block> {
    let mut segmenter = BlockSegmenter::new(markers);
    for line in text.lines() {
        segmenter.push_line(line);
    }
    segmenter.finish()
}

/// Segment a log from any reader, decoding invalid UTF-8 lossily
pub fn parse_blocks<R: BufRead>(
    mut reader: R,
    markers: &BlockMarkers,
) -> std::io::Result<Vec<Block>> {
    let mut segmenter = BlockSegmenter::new(markers);
    let mut buf = vec![];
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        segmenter.push_line(&String::from_utf8_lossy(&buf));
    }
    Ok(segmenter.finish())
}

/// Read and segment a statistics file, `.zst` files are decompressed on the fly
pub fn load_blocks<P: AsRef<Path>>(
    path: P,
    markers: &BlockMarkers,
) -> Result<Vec<Block>, StatsError> {
    let path = path.as_ref();
    let read_error = |source| StatsError::Read {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(read_error)?;
    let reader: Box<dyn Read> = if path.extension().is_some_and(|ext| ext == "zst") {
        Box::new(zstd::stream::read::Decoder::new(file).map_err(read_error)?)
    } else {
        Box::new(file)
    };
    let blocks = parse_blocks(BufReader::new(reader), markers).map_err(read_error)?;
    debug!("{}: {} blocks", path.display(), blocks.len());
    Ok(blocks)
}
