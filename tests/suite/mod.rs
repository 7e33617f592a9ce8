mod cli;
mod diagnostics;
mod lifecycle;
mod roundtrip;
