use anyhow::Result;
use tokio::io::{copy_bidirectional, AsyncRead, AsyncWrite};

/// Bidirectional byte-transparent relay between two live connections.
///
/// Both copy directions are driven by a single future, so they share one
/// join point: an error on either connection resolves `run` and both
/// streams are released together by the caller. No framing, no inspection.
pub struct BurrowTunnel<'a, X, Y>
where
    X: AsyncRead + AsyncWrite + Unpin,
    Y: AsyncRead + AsyncWrite + Unpin,
{
    l2r: &'a mut X,
    r2l: &'a mut Y,
}

impl<'a, X, Y> BurrowTunnel<'a, X, Y>
where
    X: AsyncRead + AsyncWrite + Unpin,
    Y: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(l2r: &'a mut X, r2l: &'a mut Y) -> BurrowTunnel<'a, X, Y> {
        BurrowTunnel { l2r, r2l }
    }

    /// Ferries bytes in both directions until EOF is observed on both
    /// streams or either stream fails. Returns (L->R, R->L) byte counts.
    pub async fn run(&mut self) -> Result<(u64, u64)> {
        copy_bidirectional(self.l2r, self.r2l).await.map_err(anyhow::Error::from)
    }
}
