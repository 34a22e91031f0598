use std::fs;
use std::io::{BufRead, Bytes, Read, Write};
use std::path::Path;
use std::str::FromStr;

use crate::config::AddressLayout;
use crate::error::{Result, SimError};
use crate::stats::Statistics;
use crate::translation::{AccessMode, FaultEvent, TranslationResult, VirtualAddress};
use crate::vm_manager::MemoryManager;

/// A trace line that is not a usable address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedLine {
    pub line: usize,
    pub text: String,
}

/// Lazy reader over a trace of hexadecimal virtual addresses, one per line.
///
/// An optional `0x` prefix is accepted. Blank lines are skipped. Lines that
/// are not hex, or that do not fit the configured address width, come back
/// as [`MalformedLine`] so the caller can skip them and keep going.
pub struct TraceReader<R> {
    reader: R,
    buf: Vec<u8>,
    line: usize,
    max_address: u64,
}

impl<R: BufRead> TraceReader<R> {
    pub fn new(reader: R, max_address: u64) -> Self {
        TraceReader {
            reader,
            buf: Vec::new(),
            line: 0,
            max_address,
        }
    }

    fn parse(&self, text: &str) -> Option<u64> {
        let digits = text
            .strip_prefix("0x")
            .or_else(|| text.strip_prefix("0X"))
            .unwrap_or(text);
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        u64::from_str_radix(digits, 16)
            .ok()
            .filter(|&va| va <= self.max_address)
    }
}

impl<R: BufRead> Iterator for TraceReader<R> {
    /// Outer error: the trace could not be read. Inner error: one bad line.
    type Item = std::io::Result<std::result::Result<u64, MalformedLine>>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buf.clear();
            match self.reader.read_until(b'\n', &mut self.buf) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(e) => return Some(Err(e)),
            }
            self.line += 1;

            // raw bytes, so a line that is not UTF-8 is just another bad line
            let raw = String::from_utf8_lossy(&self.buf);
            let text = raw.trim();
            if text.is_empty() {
                continue;
            }
            return Some(Ok(self.parse(text).ok_or_else(|| MalformedLine {
                line: self.line,
                text: text.to_string(),
            })));
        }
    }
}

/// Lazy reader over single-character access modes (`r`/`w`).
///
/// Whitespace between modes is ignored. An unknown character yields `None`
/// for that access; the iterator ends with the input.
pub struct ModeReader<R> {
    bytes: Bytes<R>,
}

impl<R: Read> ModeReader<R> {
    pub fn new(reader: R) -> Self {
        ModeReader {
            bytes: reader.bytes(),
        }
    }
}

impl<R: Read> Iterator for ModeReader<R> {
    type Item = Option<AccessMode>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let byte = match self.bytes.next()? {
                Ok(byte) => byte,
                Err(e) => {
                    log::warn!("stopped reading access modes: {}", e);
                    return None;
                }
            };
            if byte.is_ascii_whitespace() {
                continue;
            }
            let mode = AccessMode::from_char(byte as char);
            if mode.is_none() {
                log::warn!("unknown access mode {:?}", byte as char);
            }
            return Some(mode);
        }
    }
}

/// Output categories the reporter can emit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogCategory {
    Bitmasks,
    Offset,
    Va2Pa,
    VpnsPfn,
    Vpn2PfnPr,
    Summary,
}

impl FromStr for LogCategory {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "bitmasks" => Ok(LogCategory::Bitmasks),
            "offset" => Ok(LogCategory::Offset),
            "va2pa" | "addressTranslation" => Ok(LogCategory::Va2Pa),
            "vpns_pfn" => Ok(LogCategory::VpnsPfn),
            "vpn2pfn_pr" | "vpn2pfn_with_pagereplace" => Ok(LogCategory::Vpn2PfnPr),
            "summary" => Ok(LogCategory::Summary),
            other => Err(format!(
                "unknown log category: {} (expected bitmasks, offset, va2pa, vpns_pfn, vpn2pfn_pr or summary)",
                other
            )),
        }
    }
}

/// Which categories are enabled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogOptions {
    pub bitmasks: bool,
    pub offset: bool,
    pub va2pa: bool,
    pub vpns_pfn: bool,
    pub vpn2pfn_pr: bool,
    pub summary: bool,
}

impl LogOptions {
    /// Bitmasks, translations and mappings; offsets and the summary are opt-in
    pub fn standard() -> Self {
        LogOptions {
            bitmasks: true,
            va2pa: true,
            vpns_pfn: true,
            vpn2pfn_pr: true,
            ..Default::default()
        }
    }

    /// Exactly the given categories
    pub fn from_categories(categories: &[LogCategory]) -> Self {
        LogOptions::default().with_categories(categories)
    }

    /// Turn on `categories` in addition to what is already enabled
    pub fn with_categories(self, categories: &[LogCategory]) -> Self {
        let mut options = self;
        for category in categories {
            match category {
                LogCategory::Bitmasks => options.bitmasks = true,
                LogCategory::Offset => options.offset = true,
                LogCategory::Va2Pa => options.va2pa = true,
                LogCategory::VpnsPfn => options.vpns_pfn = true,
                LogCategory::Vpn2PfnPr => options.vpn2pfn_pr = true,
                LogCategory::Summary => options.summary = true,
            }
        }
        options
    }
}

/// Formats simulation events for the enabled categories
pub struct Reporter<W> {
    out: W,
    options: LogOptions,
}

impl<W: Write> Reporter<W> {
    pub fn new(out: W, options: LogOptions) -> Self {
        Reporter { out, options }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn bitmasks(&mut self, layout: &AddressLayout) -> std::io::Result<()> {
        if !self.options.bitmasks {
            return Ok(());
        }
        writeln!(self.out, "Bitmasks")?;
        for (level, mask) in layout.level_masks().iter().enumerate() {
            writeln!(self.out, "level {} mask {:08X}", level, mask)?;
        }
        writeln!(self.out, "offset mask {:08X}", layout.offset_mask())
    }

    pub fn translation(&mut self, va: &VirtualAddress, result: &TranslationResult) -> std::io::Result<()> {
        if self.options.offset {
            writeln!(self.out, "{:08X} offset {:X}", va.va, va.offset)?;
        }
        if self.options.va2pa {
            match result {
                TranslationResult::Success(pa) => writeln!(self.out, "{:08X} -> {:08X}", va.va, pa)?,
                TranslationResult::PageFault(_) => writeln!(self.out, "{:08X} -> page fault", va.va)?,
            }
        }
        if let TranslationResult::PageFault(event) = result {
            self.fault(event)?;
        }
        Ok(())
    }

    pub fn fault(&mut self, event: &FaultEvent) -> std::io::Result<()> {
        match event.evicted {
            Some(old) if self.options.vpn2pfn_pr && event.replacement => {
                let dirty = if event.evicted_dirty { " (dirty)" } else { "" };
                writeln!(
                    self.out,
                    "vpn {:X} -> pfn {}, replaced vpn {:X}{}",
                    event.vpn, event.frame, old, dirty
                )
            }
            _ if self.options.vpns_pfn => {
                writeln!(self.out, "vpn {:X} -> pfn {}", event.vpn, event.frame)
            }
            _ => Ok(()),
        }
    }

    pub fn summary(&mut self, stats: &Statistics, report: &RunReport, nodes: usize) -> std::io::Result<()> {
        if !self.options.summary {
            return Ok(());
        }
        writeln!(self.out, "{}", stats)?;
        writeln!(self.out, "Page table nodes: {}", nodes)?;
        writeln!(self.out, "Skipped trace lines: {}", report.skipped)
    }
}

/// Outcome of replaying a trace
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Physical address per translated access, -1 for faults
    pub results: Vec<i64>,
    pub skipped: usize,
}

/// Translate every address in `trace`, pairing each with the next entry of
/// `modes`, and report events as they happen.
///
/// Malformed lines are skipped and counted. A read error on the trace ends
/// the run with an error. Stops after `limit` translated addresses if set.
pub fn replay<R, M, W>(
    mm: &mut MemoryManager,
    trace: TraceReader<R>,
    mut modes: M,
    reporter: &mut Reporter<W>,
    limit: Option<usize>,
) -> Result<RunReport>
where
    R: BufRead,
    M: Iterator<Item = Option<AccessMode>>,
    W: Write,
{
    let mut report = RunReport::default();
    reporter.bitmasks(mm.layout())?;

    for entry in trace {
        if limit.is_some_and(|limit| report.results.len() >= limit) {
            log::info!("reached the limit of {} addresses", report.results.len());
            break;
        }

        let vaddr = match entry.map_err(SimError::Read)? {
            Ok(vaddr) => vaddr,
            Err(bad) => {
                log::warn!("skipping invalid address on trace line {}: {:?}", bad.line, bad.text);
                report.skipped += 1;
                continue;
            }
        };

        let mode = modes.next().flatten();
        let result = mm.translate_access(vaddr, mode);
        let va = VirtualAddress::from_raw(vaddr, mm.layout());
        reporter.translation(&va, &result)?;
        report.results.push(result.to_output());
    }

    reporter.summary(mm.stats(), &report, mm.page_table().node_count())?;
    Ok(report)
}

/// Open the trace file for lazy reading
pub fn open_trace<P: AsRef<Path>>(path: P, layout: &AddressLayout) -> Result<TraceReader<std::io::BufReader<fs::File>>> {
    let file = fs::File::open(path.as_ref()).map_err(|e| SimError::io(path.as_ref(), e))?;
    Ok(TraceReader::new(std::io::BufReader::new(file), layout.max_address()))
}

/// Open the access-mode file for lazy reading
pub fn open_modes<P: AsRef<Path>>(path: P) -> Result<ModeReader<std::io::BufReader<fs::File>>> {
    let file = fs::File::open(path.as_ref()).map_err(|e| SimError::io(path.as_ref(), e))?;
    Ok(ModeReader::new(std::io::BufReader::new(file)))
}

pub fn write_results<P: AsRef<Path>>(path: P, results: &[i64]) -> Result<()> {
    let output: Vec<String> = results.iter().map(|r| r.to_string()).collect();
    let content = output.join(" ");
    fs::write(path.as_ref(), content).map_err(|e| SimError::io(path.as_ref(), e))
}
