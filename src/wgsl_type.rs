/// Type for values that can be written as a WGSL literal, such as the value of a constant put into
/// a shader with [`ShaderBuilder::put_constant`](crate::ShaderBuilder::put_constant).
pub trait WGSLType {
	/// Returns the name of the type in WGSL syntax.
	fn type_name() -> String;

	/// Returns the value as a WGSL expression.
	fn definition(&self) -> String;
}

#[duplicate::duplicate_item(
	scalar	suffix;
	[u32]	["u"];
	[i32]	["i"];
)]
impl WGSLType for scalar {
	fn type_name() -> String {
		stringify!(scalar).to_string()
	}

	fn definition(&self) -> String {
		format!("{self}{}", suffix)
	}
}

/// WGSL has no literal for NaN or the infinities. Those values render as `NaNf`, `inff` and
/// `-inff`, which a WGSL compiler rejects, so only finite values should be put into a shader.
impl WGSLType for f32 {
	fn type_name() -> String {
		"f32".to_string()
	}

	fn definition(&self) -> String {
		// Debug keeps the fractional part of whole numbers: `1.0`, not `1`.
		format!("{self:?}f")
	}
}

impl WGSLType for bool {
	fn type_name() -> String {
		"bool".to_string()
	}

	fn definition(&self) -> String {
		self.to_string()
	}
}

#[cfg(any(feature = "array_vectors", feature = "cgmath_vectors"))]
fn vector_definition<T: WGSLType>(components: &[T]) -> String {
	let components: Vec<String> = components.iter().map(WGSLType::definition).collect();
	format!(
		"vec{}<{}>({})",
		components.len(),
		T::type_name(),
		components.join(", ")
	)
}

#[cfg(feature = "array_vectors")]
#[duplicate::duplicate_item(size; [2]; [3]; [4])]
impl<T: WGSLType> WGSLType for [T; size] {
	fn type_name() -> String {
		format!("vec{}<{}>", size, T::type_name())
	}

	fn definition(&self) -> String {
		vector_definition(self)
	}
}

#[cfg(feature = "cgmath_vectors")]
#[duplicate::duplicate_item(
	vector				size;
	[cgmath::Vector2]	[2];
	[cgmath::Vector3]	[3];
	[cgmath::Vector4]	[4];
)]
impl<T: WGSLType> WGSLType for vector<T> {
	fn type_name() -> String {
		format!("vec{}<{}>", size, T::type_name())
	}

	fn definition(&self) -> String {
		let components: &[T; size] = self.as_ref();
		vector_definition(components)
	}
}

#[cfg(test)]
mod tests {
	use super::WGSLType;

	#[test]
	fn scalars() {
		assert_eq!(u32::type_name(), "u32");
		assert_eq!(7u32.definition(), "7u");
		assert_eq!(i32::type_name(), "i32");
		assert_eq!((-3i32).definition(), "-3i");
		assert_eq!(2f32.definition(), "2.0f");
		assert_eq!(0.25f32.definition(), "0.25f");
		assert_eq!(true.definition(), "true");
	}

	#[test]
	fn non_finite_floats_are_not_wgsl() {
		assert_eq!(1e20f32.definition(), "1e20f");
		assert_eq!(f32::NAN.definition(), "NaNf");
		assert_eq!(f32::INFINITY.definition(), "inff");
		assert_eq!(f32::NEG_INFINITY.definition(), "-inff");
	}

	#[cfg(feature = "array_vectors")]
	#[test]
	fn array_vectors() {
		assert_eq!(<[f32; 4]>::type_name(), "vec4<f32>");
		assert_eq!(
			[1u32, 2u32].definition(),
			"vec2<u32>(1u, 2u)"
		);
	}

	#[cfg(feature = "cgmath_vectors")]
	#[test]
	fn cgmath_vectors() {
		assert_eq!(
			cgmath::Vector3::<i32>::new(1, 2, 3).definition(),
			"vec3<i32>(1i, 2i, 3i)"
		);
	}
}
