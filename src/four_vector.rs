use jetty::PseudoJet;
use noisy_float::prelude::*;
use serde::{Deserialize, Serialize};

/// A basic four-vector
///
/// The zero component is the energy/time component. The remainder are
/// the spatial components
#[derive(
    Deserialize,
    Serialize,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Debug,
    Clone,
    Copy,
    Default,
)]
pub struct FourVector {
    pt: N64,
    p: [N64; 4],
}

impl FourVector {
    /// Construct a new four-vector
    pub fn new() -> Self {
        Self::default()
    }

    /// The spatial norm \sqrt{\sum v_i^2} with i = 1,2,3
    pub fn spatial_norm(&self) -> N64 {
        self.spatial_norm_sq().sqrt()
    }

    /// The square \sum v_i^2 with i = 1,2,3 of the spatial norm
    pub fn spatial_norm_sq(&self) -> N64 {
        self.p.iter().skip(1).map(|e| *e * *e).sum()
    }

    /// The scalar transverse momentum
    pub fn pt(&self) -> N64 {
        self.pt
    }

    const fn len() -> usize {
        4
    }

    fn update_pt(&mut self) {
        self.pt = (self.p[1] * self.p[1] + self.p[2] * self.p[2]).sqrt();
    }

    /// The invariant mass \sqrt{v_0^2 - \sum v_i^2} with i = 1,2,3
    ///
    /// Spacelike vectors, including those that are only spacelike
    /// due to rounding, have mass zero. Use [FourVector::m_sq] to
    /// tell them apart. Vectors with non-finite components have
    /// infinite mass.
    pub fn m(&self) -> N64 {
        let (scale, m_sq) = self.scaled_m_sq();
        n64(scale * m_sq.max(0.).sqrt())
    }

    /// The invariant mass square v_0^2 - \sum v_i^2 with i = 1,2,3
    ///
    /// Saturates at ±infinity outside the floating-point range.
    pub fn m_sq(&self) -> N64 {
        let (scale, m_sq) = self.scaled_m_sq();
        if m_sq == 0. {
            n64(0.)
        } else {
            n64(scale * (scale * m_sq))
        }
    }

    /// Whether the invariant mass square is negative
    pub fn is_spacelike(&self) -> bool {
        self.scaled_m_sq().1 < 0.
    }

    /// Whether all components are finite
    pub fn is_finite(&self) -> bool {
        self.p.iter().all(|p| p.raw().is_finite())
    }

    // invariant mass square as `scale^2 * m_sq`
    //
    // For large components the squares overflow, so we divide by the
    // largest absolute component first.
    fn scaled_m_sq(&self) -> (f64, f64) {
        let p = self.p.map(|p| p.raw());
        let m_sq = p[0] * p[0] - (p[1] * p[1] + p[2] * p[2] + p[3] * p[3]);
        if m_sq.is_finite() {
            return (1., m_sq);
        }
        let scale = p.iter().fold(0f64, |acc, p| acc.max(p.abs()));
        if !scale.is_finite() {
            return (f64::INFINITY, 1.);
        }
        let p = p.map(|p| p / scale);
        (scale, p[0] * p[0] - (p[1] * p[1] + p[2] * p[2] + p[3] * p[3]))
    }
}

impl std::convert::From<[N64; 4]> for FourVector {
    fn from(p: [N64; 4]) -> FourVector {
        let mut res = FourVector {
            p,
            pt: std::default::Default::default(),
        };
        res.update_pt();
        res
    }
}

impl std::ops::Index<usize> for FourVector {
    type Output = N64;

    fn index(&self, i: usize) -> &Self::Output {
        &self.p[i]
    }
}

impl std::ops::AddAssign for FourVector {
    fn add_assign(&mut self, rhs: FourVector) {
        for i in 0..Self::len() {
            self.p[i] += rhs[i]
        }
        self.update_pt();
    }
}

impl std::ops::SubAssign for FourVector {
    fn sub_assign(&mut self, rhs: FourVector) {
        for i in 0..Self::len() {
            self.p[i] -= rhs[i]
        }
        self.update_pt();
    }
}

impl std::ops::MulAssign<N64> for FourVector {
    fn mul_assign(&mut self, rhs: N64) {
        for p in &mut self.p {
            *p *= rhs
        }
        self.update_pt();
    }
}

impl std::ops::Add for FourVector {
    type Output = Self;

    fn add(mut self, rhs: FourVector) -> Self::Output {
        self += rhs;
        self
    }
}

impl std::ops::Sub for FourVector {
    type Output = Self;

    fn sub(mut self, rhs: FourVector) -> Self::Output {
        self -= rhs;
        self
    }
}

impl std::ops::Mul<N64> for FourVector {
    type Output = Self;

    fn mul(mut self, rhs: N64) -> Self::Output {
        self *= rhs;
        self
    }
}

impl std::iter::Sum for FourVector {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), std::ops::Add::add)
    }
}

impl From<PseudoJet> for FourVector {
    fn from(p: PseudoJet) -> Self {
        [p.e(), p.px(), p.py(), p.pz()].into()
    }
}

impl From<FourVector> for PseudoJet {
    fn from(p: FourVector) -> Self {
        (&p).into()
    }
}

impl From<&FourVector> for PseudoJet {
    fn from(p: &FourVector) -> Self {
        [p[0], p[1], p[2], p[3]].into()
    }
}
