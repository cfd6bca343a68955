use palette::cast::ArrayCast;

/// A color type that can be viewed as an array of `N` components of type `Component`.
///
/// This is automatically implemented for all of the `palette` color types with the right layout,
/// e.g., `Srgb<u8>` is `ColorComponents<u8, 3>`.
pub trait ColorComponents<Component, const N: usize>:
    ArrayCast<Array = [Component; N]> + Copy + 'static
{
}

impl<Color, Component, const N: usize> ColorComponents<Component, N> for Color where
    Color: ArrayCast<Array = [Component; N]> + Copy + 'static
{
}

/// An 8-bit RGB color type that the k-means quantizer can cluster.
pub trait Rgb8: ColorComponents<u8, 3> + Send + Sync {}

impl<Color> Rgb8 for Color where Color: ColorComponents<u8, 3> + Send + Sync {}
