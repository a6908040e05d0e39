use nalgebra::Vector3;

/// Periodic simulation cell geometry: three edge lengths and three angles.
///
/// Lengths are in Angstroms, angles in degrees, following the crystallographic
/// convention (`alpha` between b and c, `beta` between a and c, `gamma` between a and b).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxMetadata {
    pub lengths: Vector3<f64>,
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
}

/// Edge lengths and tilt factors of a LAMMPS-style restricted triclinic cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellExtent {
    pub lx: f64,
    pub ly: f64,
    pub lz: f64,
    pub xy: f64,
    pub xz: f64,
    pub yz: f64,
}

const RIGHT_ANGLE_TOLERANCE: f64 = 1e-8;

impl BoxMetadata {
    pub fn new(lengths: [f64; 3], angles: [f64; 3]) -> Self {
        Self {
            lengths: Vector3::new(lengths[0], lengths[1], lengths[2]),
            alpha: angles[0],
            beta: angles[1],
            gamma: angles[2],
        }
    }

    pub fn orthorhombic(x: f64, y: f64, z: f64) -> Self {
        Self::new([x, y, z], [90.0, 90.0, 90.0])
    }

    pub fn is_orthogonal(&self) -> bool {
        [self.alpha, self.beta, self.gamma]
            .iter()
            .all(|a| (a - 90.0).abs() < RIGHT_ANGLE_TOLERANCE)
    }

    /// Converts lengths and angles into edge lengths and tilt factors.
    ///
    /// For an orthogonal cell the tilt factors are exactly zero and the edge
    /// lengths are the input lengths unchanged.
    pub fn extent(&self) -> CellExtent {
        let (a, b, c) = (self.lengths.x, self.lengths.y, self.lengths.z);
        if self.is_orthogonal() {
            return CellExtent {
                lx: a,
                ly: b,
                lz: c,
                xy: 0.0,
                xz: 0.0,
                yz: 0.0,
            };
        }

        let (cos_a, cos_b, cos_g) = (
            self.alpha.to_radians().cos(),
            self.beta.to_radians().cos(),
            self.gamma.to_radians().cos(),
        );
        let lx = a;
        let xy = b * cos_g;
        let xz = c * cos_b;
        let ly = (b * b - xy * xy).sqrt();
        let yz = (b * c * cos_a - xy * xz) / ly;
        let lz = (c * c - xz * xz - yz * yz).sqrt();

        CellExtent {
            lx,
            ly,
            lz,
            xy,
            xz,
            yz,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn orthogonal_cell_has_zero_tilt() {
        let cell = BoxMetadata::orthorhombic(41.2, 40.0, 39.5);
        assert!(cell.is_orthogonal());

        let extent = cell.extent();
        assert_eq!(extent.lx, 41.2);
        assert_eq!(extent.ly, 40.0);
        assert_eq!(extent.lz, 39.5);
        assert_eq!((extent.xy, extent.xz, extent.yz), (0.0, 0.0, 0.0));
    }

    #[test]
    fn monoclinic_cell_tilts_along_xz_only() {
        let cell = BoxMetadata::new([10.0, 10.0, 10.0], [90.0, 60.0, 90.0]);
        let extent = cell.extent();

        assert!(approx_eq(extent.lx, 10.0));
        assert!(approx_eq(extent.xy, 0.0));
        assert!(approx_eq(extent.xz, 5.0));
        assert!(approx_eq(extent.yz, 0.0));
        assert!(approx_eq(extent.lz, 75.0_f64.sqrt()));
    }
}
